use serde::Serialize;

use vigil_core::Record;

/// Output of a detector, serialized as-is by the HTTP layer.
///
/// Most detectors answer with a bare boolean. Tukey's full-series contract
/// returns the outlying records themselves, and HistogramBins reports which
/// bin the tail average landed in when that bin is sparse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Verdict {
    Flag(bool),
    Outliers(Vec<Record>),
    BinMembership(BinMembership),
}

/// Bin membership result for HistogramBins: whether the tail average sits
/// in a sparse bin, and if so which one and how populated it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinMembership {
    pub anomalous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<usize>,
}

impl Verdict {
    /// Collapse to the boolean anomaly flag.
    pub fn is_anomalous(&self) -> bool {
        match self {
            Verdict::Flag(flag) => *flag,
            Verdict::Outliers(records) => !records.is_empty(),
            Verdict::BinMembership(bins) => bins.anomalous,
        }
    }
}
