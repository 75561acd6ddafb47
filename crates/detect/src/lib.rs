//! Stateless anomaly detectors over a [`TimeSeries`].
//!
//! Each detector is a parameter struct implementing [`Detect`]: a pure
//! function from a series to a [`Verdict`]. Detectors never mutate their
//! input, keep no state between calls, and resolve numeric degeneracy
//! (zero spread, too few points) to a non-anomalous verdict instead of
//! raising.

pub mod outlier;
pub mod skyline;
pub mod stats;
pub mod verdict;

use vigil_core::TimeSeries;

pub use outlier::{Tukey, TukeyMode};
pub use skyline::{
    FirstHourAverage, Grubbs, HistogramBins, LeastSquares, MeanSubtractionCumulation,
    MedianAbsoluteDeviation, StddevFromAverage, StddevFromMovingAverage,
};
pub use verdict::{BinMembership, Verdict};

/// Capability interface implemented by every detector, independent of any
/// transport binding.
pub trait Detect {
    fn detect(&self, series: &TimeSeries) -> Verdict;
}

/// Average of the last up to three values, used as the "current value"
/// proxy to reduce single-point noise. Falls back to the last value alone
/// when fewer than three records exist.
pub fn tail_average(series: &TimeSeries) -> f64 {
    let values = series.values();
    let n = values.len();
    if n >= 3 {
        (values[n - 1] + values[n - 2] + values[n - 3]) / 3.0
    } else {
        values[n - 1]
    }
}
