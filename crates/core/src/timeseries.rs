use crate::error::VigilError;

/// One observation: a fixed-arity tuple of numeric fields.
///
/// Different backends place the timestamp and the observed value at
/// different positions, so a record is just the raw row; the owning
/// [`TimeSeries`] knows which column is which.
pub type Record = Vec<f64>;

/// The uniform in-memory timeseries representation all detectors consume.
///
/// Immutable after construction: one is produced per request (from a
/// backend adapter or an inline body) and read by exactly one detector.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    records: Vec<Record>,
    time_index: usize,
    value_index: usize,
}

impl TimeSeries {
    /// Build a series, validating that it is non-empty and that both
    /// column indices are in range for every record.
    pub fn new(
        records: Vec<Record>,
        time_index: usize,
        value_index: usize,
    ) -> Result<Self, VigilError> {
        if records.is_empty() {
            return Err(VigilError::MalformedPayload("empty series".to_string()));
        }
        for (i, record) in records.iter().enumerate() {
            if time_index >= record.len() || value_index >= record.len() {
                return Err(VigilError::MalformedPayload(format!(
                    "record {} has arity {} but indices are (time={}, value={})",
                    i,
                    record.len(),
                    time_index,
                    value_index
                )));
            }
        }
        Ok(Self {
            records,
            time_index,
            value_index,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn time_index(&self) -> usize {
        self.time_index
    }

    pub fn value_index(&self) -> usize {
        self.value_index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The value column, in record order.
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r[self.value_index]).collect()
    }

    /// The time column, in record order.
    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r[self.time_index]).collect()
    }

    /// Value of the final record. Construction guarantees non-emptiness.
    pub fn last_value(&self) -> f64 {
        self.records[self.records.len() - 1][self.value_index]
    }
}
