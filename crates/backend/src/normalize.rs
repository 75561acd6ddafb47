//! Input normalization: both entry modes end in a uniform [`TimeSeries`].
//!
//! Backend mode delegates to the registry and passes the adapter's native
//! column convention through. Inline mode decodes the request body —
//! MessagePack when the content type says so, JSON otherwise — and applies
//! the caller's column overrides (defaulting to time=0, value=1).

use std::collections::HashMap;

use vigil_core::{Record, TimeSeries, VigilError};

use crate::registry::Registry;

pub const DEFAULT_TIME_INDEX: usize = 0;
pub const DEFAULT_VALUE_INDEX: usize = 1;

/// Resolve a series via a named backend. `params` must contain `backend`;
/// the rest is handed to the adapter untouched.
pub async fn from_backend(
    registry: &Registry,
    params: &HashMap<String, String>,
) -> Result<TimeSeries, VigilError> {
    let backend = params
        .get("backend")
        .ok_or_else(|| VigilError::MissingParameter("backend".to_string()))?;
    registry.fetch(backend, params).await
}

/// Decode an inline-submitted series body.
///
/// Any content type other than msgpack falls back to JSON decoding. The
/// payload must be a sequence of numeric records; anything else is a
/// malformed payload.
pub fn from_inline(
    body: &[u8],
    content_type: Option<&str>,
    time_index: Option<usize>,
    value_index: Option<usize>,
) -> Result<TimeSeries, VigilError> {
    let records: Vec<Record> = if content_type.is_some_and(|ct| ct.contains("msgpack")) {
        rmp_serde::from_slice(body)
            .map_err(|e| VigilError::MalformedPayload(format!("msgpack decode: {}", e)))?
    } else {
        serde_json::from_slice(body)
            .map_err(|e| VigilError::MalformedPayload(format!("json decode: {}", e)))?
    };

    TimeSeries::new(
        records,
        time_index.unwrap_or(DEFAULT_TIME_INDEX),
        value_index.unwrap_or(DEFAULT_VALUE_INDEX),
    )
}
