pub mod usage_queries;

pub use usage_queries::{CommodityDailyTotalRow, DailyTotal};
