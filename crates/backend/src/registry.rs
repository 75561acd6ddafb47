use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vigil_core::{TimeSeries, VigilError};

use crate::{GraphiteAdapter, InfluxDbAdapter};

/// A named retrieval strategy for one kind of timeseries store.
///
/// `fetch` performs the single blocking network call of a request and
/// returns a [`TimeSeries`] carrying the adapter's own column convention,
/// so callers never hard-code which tuple position is time vs. value.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch(&self, params: &HashMap<String, String>) -> Result<TimeSeries, VigilError>;
}

/// Explicit name-to-adapter table. Built once at process start; lookups
/// afterwards are read-only and need no coordination.
pub struct Registry {
    adapters: HashMap<&'static str, Arc<dyn BackendAdapter>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// The two mandatory adapters, sharing one HTTP client.
    pub fn with_defaults(client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(InfluxDbAdapter::new(client.clone())));
        registry.register(Arc::new(GraphiteAdapter::new(client)));
        registry
    }

    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        self.adapters.insert(adapter.name(), adapter);
    }

    /// Names of every registered adapter.
    pub fn names(&self) -> Vec<String> {
        self.adapters.keys().map(|k| k.to_string()).collect()
    }

    pub async fn fetch(
        &self,
        name: &str,
        params: &HashMap<String, String>,
    ) -> Result<TimeSeries, VigilError> {
        let adapter = self
            .adapters
            .get(name)
            .ok_or_else(|| VigilError::BackendNotFound(name.to_string()))?;
        debug!(backend = name, "fetching timeseries");
        adapter.fetch(params).await
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a required adapter parameter.
pub(crate) fn require<'a>(
    params: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, VigilError> {
    params
        .get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| VigilError::MissingParameter(key.to_string()))
}

/// `protocol` parameter, defaulting to plain http.
pub(crate) fn protocol(params: &HashMap<String, String>) -> &str {
    params.get("protocol").map(|s| s.as_str()).unwrap_or("http")
}
