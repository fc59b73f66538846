use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use promkit_core::error::{MetricsError, Result};
use promkit_core::{
    Buckets, Counter, Family, FamilyOpts, Gauge, Histogram, LabelSet, Quantile, Registry, Summary,
    SummaryConfig,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromkitConfig {
    pub version: u32,

    #[serde(default)]
    pub exposer: ExposerSection,

    #[serde(default)]
    pub families: Vec<FamilyDecl>,
}

impl Default for PromkitConfig {
    fn default() -> Self {
        Self {
            version: 1,
            exposer: ExposerSection::default(),
            families: Vec::new(),
        }
    }
}

impl PromkitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::InvalidConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.exposer.validate()?;

        let mut seen = HashSet::new();
        for f in &self.families {
            f.validate()?;
            if !seen.insert(f.name.as_str()) {
                return Err(MetricsError::InvalidConfig(format!(
                    "family {:?} declared twice",
                    f.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExposerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ExposerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

impl ExposerSection {
    /// Listen on `listen`, serving the default path.
    pub fn new(listen: impl Into<String>) -> Self {
        Self {
            listen: listen.into(),
            path: default_path(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(MetricsError::InvalidConfig(format!(
                "exposer.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        validate_path(&self.path)
    }
}

/// Endpoint paths are absolute and contain no whitespace or query part.
pub fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') || path.contains(|c: char| c.is_whitespace() || c == '?' || c == '#')
    {
        return Err(MetricsError::InvalidConfig(format!(
            "endpoint path must start with '/' and contain no whitespace, got {path:?}"
        )));
    }
    Ok(())
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_path() -> String {
    "/metrics".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyType {
    Counter,
    Gauge,
    Histogram,
    Summary,
}

impl FamilyType {
    pub fn as_str(self) -> &'static str {
        match self {
            FamilyType::Counter => "counter",
            FamilyType::Gauge => "gauge",
            FamilyType::Histogram => "histogram",
            FamilyType::Summary => "summary",
        }
    }
}

/// A family declared up front in the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyDecl {
    pub name: String,

    #[serde(default)]
    pub help: String,

    #[serde(rename = "type")]
    pub kind: FamilyType,

    #[serde(default)]
    pub const_labels: BTreeMap<String, String>,

    /// Histogram only. Defaults to the standard latency buckets.
    #[serde(default)]
    pub buckets: Option<Vec<f64>>,

    /// Summary only.
    #[serde(default)]
    pub quantiles: Option<Vec<Quantile>>,

    /// Summary only.
    #[serde(default)]
    pub max_age_secs: Option<u64>,

    /// Summary only.
    #[serde(default)]
    pub age_buckets: Option<u32>,
}

/// Handle to a family registered from a declaration.
#[derive(Clone)]
pub enum DeclaredFamily {
    Counter(Arc<Family<Counter>>),
    Gauge(Arc<Family<Gauge>>),
    Histogram(Arc<Family<Histogram>>),
    Summary(Arc<Family<Summary>>),
}

impl FamilyDecl {
    pub fn validate(&self) -> Result<()> {
        let misplaced = |field: &str| {
            MetricsError::InvalidConfig(format!(
                "family {:?}: `{field}` is not allowed on a {} family",
                self.name,
                self.kind.as_str()
            ))
        };
        if self.kind != FamilyType::Histogram && self.buckets.is_some() {
            return Err(misplaced("buckets"));
        }
        if self.kind != FamilyType::Summary {
            if self.quantiles.is_some() {
                return Err(misplaced("quantiles"));
            }
            if self.max_age_secs.is_some() {
                return Err(misplaced("max_age_secs"));
            }
            if self.age_buckets.is_some() {
                return Err(misplaced("age_buckets"));
            }
        }
        // Build the family once so name, label and bucket errors surface at load time.
        match self.kind {
            FamilyType::Counter => drop(Family::<Counter>::new(self.opts(())?)?),
            FamilyType::Gauge => drop(Family::<Gauge>::new(self.opts(())?)?),
            FamilyType::Histogram => drop(Family::<Histogram>::new(self.opts(self.buckets()?)?)?),
            FamilyType::Summary => drop(Family::<Summary>::new(self.opts(self.summary_config())?)?),
        }
        Ok(())
    }

    /// Register this declaration in `registry`, merging with an identical family.
    pub fn register(&self, registry: &Registry) -> Result<DeclaredFamily> {
        Ok(match self.kind {
            FamilyType::Counter => DeclaredFamily::Counter(registry.add_counter(self.opts(())?)?),
            FamilyType::Gauge => DeclaredFamily::Gauge(registry.add_gauge(self.opts(())?)?),
            FamilyType::Histogram => {
                DeclaredFamily::Histogram(registry.add_histogram(self.opts(self.buckets()?)?)?)
            }
            FamilyType::Summary => {
                DeclaredFamily::Summary(registry.add_summary(self.opts(self.summary_config())?)?)
            }
        })
    }

    fn opts<C>(&self, config: C) -> Result<FamilyOpts<C>> {
        Ok(FamilyOpts {
            name: self.name.clone(),
            help: self.help.clone(),
            const_labels: LabelSet::from_pairs(self.const_labels.clone())?,
            config,
        })
    }

    fn buckets(&self) -> Result<Buckets> {
        match &self.buckets {
            Some(bounds) => Buckets::new(bounds.clone()),
            None => Ok(Buckets::default()),
        }
    }

    fn summary_config(&self) -> SummaryConfig {
        let mut cfg = SummaryConfig::new(self.quantiles.clone().unwrap_or_default());
        if let Some(secs) = self.max_age_secs {
            cfg.max_age = Duration::from_secs(secs);
        }
        if let Some(n) = self.age_buckets {
            cfg.age_buckets = n as usize;
        }
        cfg
    }
}
