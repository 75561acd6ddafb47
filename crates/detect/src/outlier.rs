//! Interquartile-range outlier test.

use vigil_core::{Record, TimeSeries};

use crate::stats;
use crate::verdict::Verdict;
use crate::Detect;

/// Which contract the caller wants from [`Tukey`]: every outlying record,
/// or a boolean for the final record only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TukeyMode {
    #[default]
    FullSeries,
    LastPoint,
}

/// A record is an outlier if its value is more than `outlier_threshold`
/// times the interquartile range below the first quartile or above the
/// third.
#[derive(Debug, Clone)]
pub struct Tukey {
    pub outlier_threshold: f64,
    pub mode: TukeyMode,
}

impl Default for Tukey {
    fn default() -> Self {
        Self {
            outlier_threshold: 1.5,
            mode: TukeyMode::FullSeries,
        }
    }
}

impl Tukey {
    fn bounds(&self, values: &[f64]) -> (f64, f64) {
        let q25 = stats::percentile(values, 25.0);
        let q75 = stats::percentile(values, 75.0);
        let iqr = q75 - q25;
        (
            q25 - self.outlier_threshold * iqr,
            q75 + self.outlier_threshold * iqr,
        )
    }

    /// Every record whose value falls strictly outside the IQR bounds.
    pub fn outliers(&self, series: &TimeSeries) -> Vec<Record> {
        let values = series.values();
        let (low, high) = self.bounds(&values);
        series
            .records()
            .iter()
            .filter(|r| {
                let v = r[series.value_index()];
                v < low || v > high
            })
            .cloned()
            .collect()
    }

    /// Whether the final record falls outside the IQR bounds.
    pub fn is_last_outlier(&self, series: &TimeSeries) -> bool {
        let values = series.values();
        let (low, high) = self.bounds(&values);
        let last = series.last_value();
        last < low || last > high
    }
}

impl Detect for Tukey {
    fn detect(&self, series: &TimeSeries) -> Verdict {
        match self.mode {
            TukeyMode::FullSeries => Verdict::Outliers(self.outliers(series)),
            TukeyMode::LastPoint => Verdict::Flag(self.is_last_outlier(series)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> TimeSeries {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| vec![(i + 1) as f64, *v])
            .collect();
        TimeSeries::new(records, 0, 1).unwrap()
    }

    #[test]
    fn returned_records_partition_on_the_bounds() {
        let values = [
            10.0, 11.0, 9.0, 10.5, 9.5, 10.0, 11.5, 8.5, 10.0, 9.0, 11.0, 10.0, 55.0, -30.0,
        ];
        let ts = series(&values);
        let tukey = Tukey::default();

        let outliers = tukey.outliers(&ts);
        let (low, high) = tukey.bounds(&ts.values());

        for r in &outliers {
            let v = r[1];
            assert!(v < low || v > high, "returned record {v} is inside bounds");
        }
        let excluded = ts
            .records()
            .iter()
            .filter(|r| !outliers.contains(r))
            .count();
        assert_eq!(excluded + outliers.len(), ts.len());
        for r in ts.records().iter().filter(|r| !outliers.contains(r)) {
            let v = r[1];
            assert!(v >= low && v <= high, "excluded record {v} is outside bounds");
        }
        assert_eq!(outliers.len(), 2);
    }

    #[test]
    fn last_point_mode_answers_for_the_final_record() {
        let mut values = vec![10.0, 11.0, 9.0, 10.5, 9.5, 10.0, 11.5, 8.5, 10.0, 9.0];
        values.push(10.2);
        let quiet = Tukey {
            mode: TukeyMode::LastPoint,
            ..Tukey::default()
        };
        assert_eq!(quiet.detect(&series(&values)), Verdict::Flag(false));

        *values.last_mut().unwrap() = 55.0;
        assert_eq!(quiet.detect(&series(&values)), Verdict::Flag(true));
    }

    #[test]
    fn wider_threshold_admits_more_records() {
        let values = [10.0, 11.0, 9.0, 10.5, 9.5, 10.0, 11.5, 8.5, 14.0];
        let strict = Tukey::default();
        let loose = Tukey {
            outlier_threshold: 20.0,
            ..Tukey::default()
        };
        assert!(!strict.outliers(&series(&values)).is_empty());
        assert!(loose.outliers(&series(&values)).is_empty());
    }

    #[test]
    fn full_series_verdict_carries_the_records() {
        let ts = series(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 99.0]);
        match Tukey::default().detect(&ts) {
            Verdict::Outliers(records) => {
                assert_eq!(records, vec![vec![8.0, 99.0]]);
            }
            other => panic!("expected outlier records, got {:?}", other),
        }
    }
}
