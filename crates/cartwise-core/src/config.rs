//! Engine configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path (`--config`), or the override in the data dir
//!    (~/.local/share/cartwise/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Environment variables are applied on top of whichever file won:
//! `CARTWISE_THRESHOLD`, `CARTWISE_MAX_ALTERNATIVES`, `CARTWISE_CATALOG`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::substitution::{DEFAULT_MAX_ALTERNATIVES, DEFAULT_SUBSTITUTION_THRESHOLD};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

pub const ENV_THRESHOLD: &str = "CARTWISE_THRESHOLD";
pub const ENV_MAX_ALTERNATIVES: &str = "CARTWISE_MAX_ALTERNATIVES";
pub const ENV_CATALOG: &str = "CARTWISE_CATALOG";

/// Tunables for the substitution engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Minimum similarity for a catalog product to be considered
    pub threshold: f64,
    /// Substitutions kept per purchased item
    pub max_alternatives: usize,
    /// Catalog file; `None` means the embedded sample catalog
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SUBSTITUTION_THRESHOLD,
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// Resolve config from files, then apply environment overrides
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = load_config(explicit_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Apply `CARTWISE_*` overrides from `lookup`
    ///
    /// Unparsable or out-of-range values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_THRESHOLD) {
            match raw.trim().parse::<f64>() {
                Ok(t) if valid_threshold(t) => self.threshold = t,
                _ => warn!("Ignoring {}={:?}: expected a number in (0, 1]", ENV_THRESHOLD, raw),
            }
        }

        if let Some(raw) = lookup(ENV_MAX_ALTERNATIVES) {
            match raw.trim().parse::<usize>() {
                Ok(n) if valid_max_alternatives(n) => self.max_alternatives = n,
                _ => warn!(
                    "Ignoring {}={:?}: expected an integer in 1..={}",
                    ENV_MAX_ALTERNATIVES, raw, DEFAULT_MAX_ALTERNATIVES
                ),
            }
        }

        if let Some(raw) = lookup(ENV_CATALOG) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.catalog_path = Some(PathBuf::from(raw));
            }
        }
    }
}

fn valid_threshold(t: f64) -> bool {
    t.is_finite() && t > 0.0 && t <= 1.0
}

/// At least one and never more than the default of 3 alternatives per item
fn valid_max_alternatives(n: usize) -> bool {
    (1..=DEFAULT_MAX_ALTERNATIVES).contains(&n)
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("cartwise").join("config").join("engine.toml"))
}

/// Load configuration (override first, then default)
fn load_config(explicit_path: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit_path {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::InvalidData(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        return parse_config(&content);
    }

    if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            debug!("Using engine config override at {}", default_path.display());
            let content = fs::read_to_string(&default_path)
                .map_err(|e| Error::InvalidData(format!("Failed to read config: {}", e)))?;
            return parse_config(&content);
        }
    }

    parse_config(DEFAULT_CONFIG)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    matching: Option<RawMatching>,
    ranking: Option<RawRanking>,
    catalog: Option<RawCatalog>,
}

#[derive(Debug, Deserialize)]
struct RawMatching {
    threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRanking {
    max_alternatives: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    path: Option<PathBuf>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let mut config = EngineConfig::default();

    if let Some(threshold) = raw.matching.and_then(|m| m.threshold) {
        if !valid_threshold(threshold) {
            return Err(Error::InvalidData(format!(
                "matching.threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        config.threshold = threshold;
    }

    if let Some(max) = raw.ranking.and_then(|r| r.max_alternatives) {
        if !valid_max_alternatives(max) {
            return Err(Error::InvalidData(format!(
                "ranking.max_alternatives must be in 1..={}, got {}",
                DEFAULT_MAX_ALTERNATIVES, max
            )));
        }
        config.max_alternatives = max;
    }

    config.catalog_path = raw.catalog.and_then(|c| c.path);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.threshold, 0.2);
        assert_eq!(config.max_alternatives, 3);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = EngineConfig::from_toml("[ranking]\nmax_alternatives = 2\n").unwrap();
        assert_eq!(config.max_alternatives, 2);
        assert_eq!(config.threshold, DEFAULT_SUBSTITUTION_THRESHOLD);

        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(EngineConfig::from_toml("[matching]\nthreshold = 0.0\n").is_err());
        assert!(EngineConfig::from_toml("[matching]\nthreshold = 1.5\n").is_err());
        assert!(EngineConfig::from_toml("[matching\n").is_err());
    }

    #[test]
    fn test_max_alternatives_bounded() {
        assert!(EngineConfig::from_toml("[ranking]\nmax_alternatives = 0\n").is_err());
        assert!(EngineConfig::from_toml("[ranking]\nmax_alternatives = 4\n").is_err());
        assert!(EngineConfig::from_toml("[ranking]\nmax_alternatives = 1\n").is_ok());

        for raw in ["0", "5", "100"] {
            let mut config = EngineConfig::default();
            config.apply_overrides(|k| (k == ENV_MAX_ALTERNATIVES).then(|| raw.to_string()));
            assert_eq!(config.max_alternatives, DEFAULT_MAX_ALTERNATIVES);
        }
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.toml");
        fs::write(
            &path,
            "[matching]\nthreshold = 0.3\n\n[catalog]\npath = \"/tmp/catalog.json\"\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.catalog_path, Some(PathBuf::from("/tmp/catalog.json")));

        assert!(load_config(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_THRESHOLD, "0.35"),
            (ENV_MAX_ALTERNATIVES, "2"),
            (ENV_CATALOG, "/data/catalog.json"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.threshold, 0.35);
        assert_eq!(config.max_alternatives, 2);
        assert_eq!(config.catalog_path, Some(PathBuf::from("/data/catalog.json")));
    }

    #[test]
    fn test_bad_env_overrides_ignored() {
        let env: HashMap<&str, &str> = [
            (ENV_THRESHOLD, "loose"),
            (ENV_MAX_ALTERNATIVES, "-1"),
            (ENV_CATALOG, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config, EngineConfig::default());
    }
}
