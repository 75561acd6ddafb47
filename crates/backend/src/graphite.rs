//! Graphite-style backend adapter.
//!
//! Issues a GET against `/render` and extracts the first series'
//! `datapoints`, which arrive as `[value, timestamp]` rows: value index 0,
//! time index 1 — the reverse of the InfluxDB convention, which is why
//! detectors take explicit column indices.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use vigil_core::{Record, TimeSeries, VigilError};

use crate::influxdb::json_number;
use crate::registry::{protocol, require, BackendAdapter};

pub const TIME_INDEX: usize = 1;
pub const VALUE_INDEX: usize = 0;

pub struct GraphiteAdapter {
    client: reqwest::Client,
}

impl GraphiteAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the request URL and query pairs from connection parameters.
    /// Required: `host`, `port`, `target`, `from`, `until`; `protocol`
    /// defaults to http.
    pub fn request_parts(
        params: &HashMap<String, String>,
    ) -> Result<(String, Vec<(String, String)>), VigilError> {
        let url = format!(
            "{}://{}:{}/render",
            protocol(params),
            require(params, "host")?,
            require(params, "port")?,
        );
        let query = vec![
            ("target".to_string(), require(params, "target")?.to_string()),
            ("from".to_string(), require(params, "from")?.to_string()),
            ("until".to_string(), require(params, "until")?.to_string()),
            ("format".to_string(), "json".to_string()),
        ];
        Ok((url, query))
    }

    /// Extract the datapoint rows of the first returned series. Null
    /// values (gaps Graphite reports explicitly) come through as NaN.
    pub fn parse_response(body: &Value) -> Result<Vec<Record>, VigilError> {
        let datapoints = body
            .pointer("/0/datapoints")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                VigilError::Retrieval("graphite response missing [0].datapoints".to_string())
            })?;

        datapoints
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|fields| fields.iter().map(json_number).collect())
                    .ok_or_else(|| {
                        VigilError::Retrieval("graphite datapoint is not an array".to_string())
                    })
            })
            .collect()
    }
}

#[async_trait]
impl BackendAdapter for GraphiteAdapter {
    fn name(&self) -> &'static str {
        "graphite"
    }

    async fn fetch(&self, params: &HashMap<String, String>) -> Result<TimeSeries, VigilError> {
        let (url, query) = Self::request_parts(params)?;
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| VigilError::Retrieval(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VigilError::Retrieval(format!(
                "graphite returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VigilError::Retrieval(e.to_string()))?;
        let records = Self::parse_response(&body)?;
        TimeSeries::new(records, TIME_INDEX, VALUE_INDEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HashMap<String, String> {
        [
            ("host", "graphite.internal"),
            ("port", "8080"),
            ("target", "servers.web01.load"),
            ("from", "-1h"),
            ("until", "now"),
            ("protocol", "https"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn builds_render_url_from_params() {
        let (url, query) = GraphiteAdapter::request_parts(&params()).unwrap();
        assert_eq!(url, "https://graphite.internal:8080/render");
        assert!(query.contains(&("format".to_string(), "json".to_string())));
        assert!(query.contains(&("target".to_string(), "servers.web01.load".to_string())));
    }

    #[test]
    fn parses_datapoints_with_reversed_columns() {
        let body = serde_json::json!([{
            "target": "servers.web01.load",
            "datapoints": [[0.5, 1000], [null, 1060], [0.7, 1120]]
        }]);
        let records = GraphiteAdapter::parse_response(&body).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], vec![0.5, 1000.0]);
        assert!(records[1][0].is_nan());
        assert_eq!(records[1][1], 1060.0);
    }

    #[test]
    fn column_convention_is_value_then_time() {
        // Detectors given this series must read column 0 as the value.
        let records = vec![vec![0.5, 1000.0], vec![0.7, 1060.0]];
        let ts = TimeSeries::new(records, TIME_INDEX, VALUE_INDEX).unwrap();
        assert_eq!(ts.values(), vec![0.5, 0.7]);
        assert_eq!(ts.times(), vec![1000.0, 1060.0]);
    }

    #[test]
    fn empty_render_response_is_a_retrieval_error() {
        let body = serde_json::json!([]);
        assert!(matches!(
            GraphiteAdapter::parse_response(&body),
            Err(VigilError::Retrieval(_))
        ));
    }
}
