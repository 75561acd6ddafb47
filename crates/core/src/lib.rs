pub mod config;
pub mod error;
pub mod timeseries;

pub use config::Config;
pub use error::VigilError;
pub use timeseries::{Record, TimeSeries};
