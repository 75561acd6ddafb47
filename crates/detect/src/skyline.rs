//! The Skyline-family detectors.
//!
//! Eight independent verdict rules, each comparing a "current value" proxy
//! (usually [`tail_average`]) against a baseline statistic of the whole
//! window. Standard-deviation flavor varies by rule and is part of each
//! contract: Grubbs, LeastSquares and MeanSubtractionCumulation divide by
//! n, FirstHourAverage and StddevFromAverage by n-1.

use chrono::Utc;
use tracing::debug;

use vigil_core::TimeSeries;

use crate::stats;
use crate::verdict::{BinMembership, Verdict};
use crate::{tail_average, Detect};

/// A series is anomalous if the deviation of its latest datapoint from the
/// median is more than `deviation_threshold` times the median of all
/// deviations.
#[derive(Debug, Clone)]
pub struct MedianAbsoluteDeviation {
    pub deviation_threshold: f64,
}

impl Default for MedianAbsoluteDeviation {
    fn default() -> Self {
        Self {
            deviation_threshold: 6.0,
        }
    }
}

impl Detect for MedianAbsoluteDeviation {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let values = series.values();
        let median = stats::median(&values);
        let demedianed: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
        let median_deviation = stats::median(&demedianed);

        // A zero median deviation makes the statistic infinite and the test
        // oversensitive; skip rather than divide.
        if median_deviation == 0.0 {
            return Verdict::Flag(false);
        }

        let test_statistic = demedianed[demedianed.len() - 1] / median_deviation;
        debug!(test_statistic, median_deviation, "mad statistic");
        Verdict::Flag(test_statistic > self.deviation_threshold)
    }
}

/// A series is anomalous if the Z score of its tail average exceeds the
/// two-sided Grubbs critical value at significance 0.05.
#[derive(Debug, Clone, Default)]
pub struct Grubbs;

impl Detect for Grubbs {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let values = series.values();
        let std_dev = stats::stddev(&values);
        let mean = stats::mean(&values);
        let z_score = (tail_average(series) - mean) / std_dev;

        let n = values.len() as f64;
        let t = stats::students_t_isf(0.05 / (2.0 * n), n - 2.0);
        let t_sq = t * t;
        let grubbs_score = ((n - 1.0) / n.sqrt()) * (t_sq / (n - 2.0 + t_sq)).sqrt();

        debug!(z_score, grubbs_score, "grubbs statistic");
        Verdict::Flag(z_score > grubbs_score)
    }
}

/// Baseline the hour of data sitting `full_duration` seconds in the past
/// and flag a tail average more than three baseline stddevs away.
#[derive(Debug, Clone)]
pub struct FirstHourAverage {
    /// Age of the window in seconds; the baseline hour ends
    /// `full_duration - 3600` seconds before now.
    pub full_duration: f64,
}

impl Default for FirstHourAverage {
    fn default() -> Self {
        Self {
            full_duration: 86400.0,
        }
    }
}

impl FirstHourAverage {
    /// The rule with an explicit clock, so the cutoff is reproducible.
    pub fn detect_at(&self, series: &TimeSeries, now: f64) -> Verdict {
        let threshold = now - (self.full_duration - 3600.0);
        let baseline: Vec<f64> = series
            .records()
            .iter()
            .filter(|r| r[series.time_index()] < threshold)
            .map(|r| r[series.value_index()])
            .collect();
        if baseline.is_empty() {
            return Verdict::Flag(false);
        }

        let mean = stats::mean(&baseline);
        let std_dev = stats::sample_stddev(&baseline);
        let t = tail_average(series);
        Verdict::Flag((t - mean).abs() > 3.0 * std_dev)
    }
}

impl Detect for FirstHourAverage {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        self.detect_at(series, Utc::now().timestamp() as f64)
    }
}

/// A series is anomalous if the tail average is more than three standard
/// deviations from the mean of the whole series.
#[derive(Debug, Clone, Default)]
pub struct StddevFromAverage;

impl Detect for StddevFromAverage {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let values = series.values();
        let mean = stats::mean(&values);
        let std_dev = stats::sample_stddev(&values);
        let t = tail_average(series);
        Verdict::Flag((t - mean).abs() > 3.0 * std_dev)
    }
}

/// A series is anomalous if the last value is more than three
/// exponentially-weighted moving stddevs from the exponentially-weighted
/// moving average.
#[derive(Debug, Clone)]
pub struct StddevFromMovingAverage {
    pub com: f64,
}

impl Default for StddevFromMovingAverage {
    fn default() -> Self {
        Self { com: 50.0 }
    }
}

impl Detect for StddevFromMovingAverage {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let values = series.values();
        let (means, stds) = stats::ewm_mean_std(&values, self.com);
        let last = values[values.len() - 1];
        let last_mean = means[means.len() - 1];
        let last_std = stds[stds.len() - 1];
        Verdict::Flag((last - last_mean).abs() > 3.0 * last_std)
    }
}

/// Demean every value by the mean of all-but-the-last value and flag a last
/// demeaned value more than three stddevs of the demeaned history.
#[derive(Debug, Clone)]
pub struct MeanSubtractionCumulation {
    /// Part of the request contract; the cumulation statistic does not
    /// depend on it.
    pub com: f64,
}

impl Default for MeanSubtractionCumulation {
    fn default() -> Self {
        Self { com: 15.0 }
    }
}

impl Detect for MeanSubtractionCumulation {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let values: Vec<f64> = series
            .values()
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect();
        let n = values.len();
        if n < 2 {
            return Verdict::Flag(false);
        }

        let history_mean = stats::mean(&values[..n - 1]);
        let demeaned: Vec<f64> = values.iter().map(|v| v - history_mean).collect();
        let history_std = stats::stddev(&demeaned[..n - 1]);
        Verdict::Flag(demeaned[n - 1].abs() > 3.0 * history_std)
    }
}

/// Fit a least-squares line through the window and flag when the mean of
/// the last three residuals leaves three stddevs of all residuals.
#[derive(Debug, Clone, Default)]
pub struct LeastSquares;

impl Detect for LeastSquares {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let times = series.times();
        let values = series.values();
        let (slope, intercept) = stats::ols_fit(&times, &values);

        let residuals: Vec<f64> = times
            .iter()
            .zip(&values)
            .map(|(t, v)| v - (slope * t + intercept))
            .collect();
        if residuals.len() < 3 {
            return Verdict::Flag(false);
        }

        let std_dev = stats::stddev(&residuals);
        let n = residuals.len();
        let t_statistic = (residuals[n - 1] + residuals[n - 2] + residuals[n - 3]) / 3.0;
        debug!(t_statistic, std_dev, "least squares statistic");

        // Near-constant residual noise rounds to zero on either side and is
        // never flagged.
        Verdict::Flag(
            t_statistic.abs() > 3.0 * std_dev && std_dev.round() != 0.0 && t_statistic.round() != 0.0,
        )
    }
}

/// Bucket the window into equal-width bins and flag a tail average that
/// lands in a sparsely-populated bin (20 points or fewer).
#[derive(Debug, Clone)]
pub struct HistogramBins {
    pub bins: usize,
}

impl Default for HistogramBins {
    fn default() -> Self {
        Self { bins: 15 }
    }
}

/// Sparse-bucket cutoff: a bin this small is an outlier population.
const SPARSE_BIN_POPULATION: usize = 20;

impl Detect for HistogramBins {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        let values = series.values();
        let t = tail_average(series);
        let (counts, edges) = histogram(&values, self.bins);

        for (index, &count) in counts.iter().enumerate() {
            if count > SPARSE_BIN_POPULATION {
                continue;
            }
            // The first bin additionally owns everything at or below its
            // leading edge.
            let hit = if index == 0 {
                t <= edges[0]
            } else {
                t >= edges[index] && t < edges[index + 1]
            };
            if hit {
                return Verdict::BinMembership(BinMembership {
                    anomalous: true,
                    bin: Some(index),
                    population: Some(count),
                });
            }
        }

        Verdict::BinMembership(BinMembership {
            anomalous: false,
            bin: None,
            population: None,
        })
    }
}

/// Equal-width histogram over [min, max]; a zero-width range widens to
/// ±0.5 around the single value. The max value counts into the last bin.
fn histogram(values: &[f64], bins: usize) -> (Vec<usize>, Vec<f64>) {
    let mut lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / (hi - lo)) * bins as f64) as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    (counts, edges)
}
