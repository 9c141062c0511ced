pub mod db;
pub mod domain;

pub use domain::{Reading, UsageRecord};
