pub mod reading;
pub mod usage_record;

pub use reading::{CommodityValues, Reading};
pub use usage_record::UsageRecord;
