//! Timeseries retrieval and normalization.
//!
//! [`registry::Registry`] holds the named backend adapters (an explicit
//! registration table, populated once at startup and read-only after);
//! [`normalize`] turns either a backend fetch or an inline request body
//! into the uniform [`vigil_core::TimeSeries`].

pub mod graphite;
pub mod influxdb;
pub mod normalize;
pub mod registry;

pub use graphite::GraphiteAdapter;
pub use influxdb::InfluxDbAdapter;
pub use registry::{BackendAdapter, Registry};
