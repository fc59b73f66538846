//! Exposer config loader (strict parsing).

pub mod schema;

use std::fs;

use promkit_core::error::{MetricsError, Result};

pub use schema::{DeclaredFamily, ExposerSection, FamilyDecl, FamilyType, PromkitConfig};

pub fn load_from_file(path: &str) -> Result<PromkitConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MetricsError::InvalidConfig(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<PromkitConfig> {
    let cfg: PromkitConfig = serde_yaml::from_str(s)
        .map_err(|e| MetricsError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
