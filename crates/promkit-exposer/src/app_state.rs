//! Shared state between the exposer handle and the HTTP handler.

use std::sync::Arc;

use dashmap::DashMap;

use promkit_core::error::Result;

use crate::config::schema::validate_path;
use crate::endpoint::Endpoint;

#[derive(Clone)]
pub struct ExposerState {
    inner: Arc<ExposerStateInner>,
}

struct ExposerStateInner {
    default_path: String,
    endpoints: DashMap<String, Arc<Endpoint>>,
}

impl ExposerState {
    /// Build state with the default endpoint already mounted.
    pub fn new(default_path: &str) -> Result<Self> {
        validate_path(default_path)?;
        let endpoints = DashMap::new();
        endpoints.insert(
            default_path.to_string(),
            Arc::new(Endpoint::new(default_path)?),
        );
        Ok(Self {
            inner: Arc::new(ExposerStateInner {
                default_path: default_path.to_string(),
                endpoints,
            }),
        })
    }

    pub fn default_path(&self) -> &str {
        &self.inner.default_path
    }

    pub fn endpoint(&self, path: &str) -> Option<Arc<Endpoint>> {
        self.inner.endpoints.get(path).map(|e| Arc::clone(e.value()))
    }

    /// Look up `path`, mounting a new endpoint the first time it is used.
    pub fn endpoint_or_create(&self, path: &str) -> Result<Arc<Endpoint>> {
        if let Some(e) = self.endpoint(path) {
            return Ok(e);
        }
        validate_path(path)?;
        let created = Arc::new(Endpoint::new(path)?);
        let entry = self
            .inner
            .endpoints
            .entry(path.to_string())
            .or_insert(created);
        Ok(Arc::clone(entry.value()))
    }

    /// Mounted paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut out: Vec<String> = self.inner.endpoints.iter().map(|e| e.key().clone()).collect();
        out.sort();
        out
    }
}
