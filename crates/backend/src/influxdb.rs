//! InfluxDB-style backend adapter.
//!
//! Issues a query-language GET against `/query` and extracts
//! `results[0].series[0].values`, which arrive as `[time, value]` rows:
//! time index 0, value index 1.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use vigil_core::{Record, TimeSeries, VigilError};

use crate::registry::{protocol, require, BackendAdapter};

pub const TIME_INDEX: usize = 0;
pub const VALUE_INDEX: usize = 1;

pub struct InfluxDbAdapter {
    client: reqwest::Client,
}

impl InfluxDbAdapter {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build the request URL and query pairs from connection parameters.
    /// Required: `host`, `port`, `database`, `series`, `epoch`;
    /// `protocol` defaults to http.
    pub fn request_parts(
        params: &HashMap<String, String>,
    ) -> Result<(String, Vec<(String, String)>), VigilError> {
        let url = format!(
            "{}://{}:{}/query",
            protocol(params),
            require(params, "host")?,
            require(params, "port")?,
        );
        let query = vec![
            ("db".to_string(), require(params, "database")?.to_string()),
            ("epoch".to_string(), require(params, "epoch")?.to_string()),
            (
                "q".to_string(),
                format!("select value from {}", require(params, "series")?),
            ),
        ];
        Ok((url, query))
    }

    /// Extract the record rows from a response body.
    pub fn parse_response(body: &Value) -> Result<Vec<Record>, VigilError> {
        let values = body
            .pointer("/results/0/series/0/values")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                VigilError::Retrieval("influxdb response missing results[0].series[0].values".to_string())
            })?;

        values
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|fields| fields.iter().map(json_number).collect())
                    .ok_or_else(|| {
                        VigilError::Retrieval("influxdb values row is not an array".to_string())
                    })
            })
            .collect()
    }
}

/// Numeric field, with null kept as NaN so row arity stays fixed.
pub(crate) fn json_number(v: &Value) -> f64 {
    v.as_f64().unwrap_or(f64::NAN)
}

#[async_trait]
impl BackendAdapter for InfluxDbAdapter {
    fn name(&self) -> &'static str {
        "influxdb"
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
                "influxdb returned {}",
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
