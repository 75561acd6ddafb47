use thiserror::Error;

/// Errors raised at the normalization and retrieval boundary.
///
/// Detector math never produces an error: numeric degeneracy resolves to a
/// non-anomalous verdict inside the detector.
#[derive(Error, Debug)]
pub enum VigilError {
    #[error("backend not found: {0}")]
    BackendNotFound(String),

    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("backend retrieval failed: {0}")]
    Retrieval(String),
}
