pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod types;

pub use error::{PrepError, Result};
