pub mod anomaly;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod forecast;
pub mod http;
pub mod metrics_server;
pub mod observability;
pub mod report;
pub mod store;
pub mod usage;

pub use engine::{Engine, EngineError};
