//! Externally supplied scoring weights and decay configuration.
//!
//! TOML shape:
//!
//! ```toml
//! alpha = 0.15
//!
//! [weights]
//! vis = 1.5
//! sem = 1.0
//! auth = 1.0
//! feat = 1.0
//! clicks = 1.0
//! ```
//!
//! JSON with the same keys is accepted as well. The loaded value is an
//! immutable snapshot passed explicitly into every pipeline call; there is no
//! global state and nothing is reloaded mid-run.

use crate::error::EstimateError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "ESTIMATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/estimator.toml";

/// The five λ weights applied to the scaled signal columns.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ShareWeights {
    pub vis: f64,
    pub sem: f64,
    pub auth: f64,
    pub feat: f64,
    pub clicks: f64,
}

impl Default for ShareWeights {
    fn default() -> Self {
        Self {
            vis: 1.5,
            sem: 1.0,
            auth: 1.0,
            feat: 1.0,
            clicks: 1.0,
        }
    }
}

impl ShareWeights {
    /// Build from a `[vis, sem, auth, feat, clicks]` slice.
    pub fn from_slice(values: &[f64]) -> Result<Self, EstimateError> {
        match values {
            [vis, sem, auth, feat, clicks] => Ok(Self {
                vis: *vis,
                sem: *sem,
                auth: *auth,
                feat: *feat,
                clicks: *clicks,
            }),
            _ => Err(EstimateError::Configuration(format!(
                "expected exactly 5 weights, got {}",
                values.len()
            ))),
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [self.vis, self.sem, self.auth, self.feat, self.clicks]
    }
}

/// Immutable per-run configuration: weights plus the visibility decay.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default)]
    pub weights: ShareWeights,
    /// Visibility decay steepness; larger values concentrate visibility on
    /// the top ranks. Must be finite and > 0.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    0.15
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            weights: ShareWeights::default(),
            alpha: default_alpha(),
        }
    }
}

impl EstimatorConfig {
    pub fn new(weights: ShareWeights, alpha: f64) -> Result<Self, EstimateError> {
        let cfg = Self { weights, alpha };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(EstimateError::Configuration(format!(
                "alpha must be finite and > 0, got {}",
                self.alpha
            )));
        }
        if self.weights.as_array().iter().any(|w| !w.is_finite()) {
            return Err(EstimateError::Configuration(
                "weights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from an explicit path. TOML or JSON by extension.
pub fn load_config_from(path: &Path) -> Result<EstimatorConfig, EstimateError> {
    let content = fs::read_to_string(path).map_err(|e| {
        EstimateError::Configuration(format!("reading config from {}: {e}", path.display()))
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let cfg: EstimatorConfig = if ext == "json" {
        serde_json::from_str(&content)
            .map_err(|e| EstimateError::Configuration(format!("parsing json config: {e}")))?
    } else {
        toml::from_str(&content)
            .map_err(|e| EstimateError::Configuration(format!("parsing toml config: {e}")))?
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Load configuration using env var + fallbacks:
/// 1) $ESTIMATOR_CONFIG_PATH
/// 2) config/estimator.toml
/// 3) built-in defaults
pub fn load_config_default() -> Result<EstimatorConfig, EstimateError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(EstimateError::Configuration(
            "ESTIMATOR_CONFIG_PATH points to non-existent path".to_string(),
        ));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default.exists() {
        return load_config_from(&default);
    }
    Ok(EstimatorConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn from_slice_requires_exactly_five_values() {
        assert!(ShareWeights::from_slice(&[1.0, 1.0, 1.0, 1.0]).is_err());
        assert!(ShareWeights::from_slice(&[1.0; 6]).is_err());
        let w = ShareWeights::from_slice(&[2.0, 1.5, 1.0, 1.2, 0.8]).unwrap();
        assert_eq!(w.as_array(), [2.0, 1.5, 1.0, 1.2, 0.8]);
    }

    #[test]
    fn alpha_must_be_positive_and_finite() {
        let w = ShareWeights::default();
        assert!(EstimatorConfig::new(w, 0.0).is_err());
        assert!(EstimatorConfig::new(w, -0.1).is_err());
        assert!(EstimatorConfig::new(w, f64::NAN).is_err());
        assert!(EstimatorConfig::new(w, 0.15).is_ok());
    }

    #[test]
    fn weights_must_be_finite() {
        let w = ShareWeights::from_slice(&[f64::INFINITY, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(EstimatorConfig::new(w, 0.15).is_err());
    }

    #[test]
    fn loads_toml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("estimator.toml");
        let mut f = fs::File::create(&toml_path).unwrap();
        write!(
            f,
            "alpha = 0.2\n[weights]\nvis = 2.0\nsem = 1.0\nauth = 0.5\nfeat = 1.0\nclicks = 0.8\n"
        )
        .unwrap();
        let cfg = load_config_from(&toml_path).unwrap();
        assert!((cfg.alpha - 0.2).abs() < 1e-12);
        assert!((cfg.weights.vis - 2.0).abs() < 1e-12);

        let json_path = dir.path().join("estimator.json");
        let mut f = fs::File::create(&json_path).unwrap();
        write!(
            f,
            r#"{{"alpha": 0.3, "weights": {{"vis": 1.0, "sem": 2.0, "auth": 1.0, "feat": 1.0, "clicks": 1.0}}}}"#
        )
        .unwrap();
        let cfg = load_config_from(&json_path).unwrap();
        assert!((cfg.alpha - 0.3).abs() < 1e-12);
        assert!((cfg.weights.sem - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bad_alpha_in_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("estimator.toml");
        fs::write(&p, "alpha = -1.0\n").unwrap();
        assert!(load_config_from(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let old = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        std::env::remove_var(ENV_CONFIG_PATH);

        // No files anywhere: built-in defaults.
        let cfg = load_config_default().unwrap();
        assert_eq!(cfg, EstimatorConfig::default());

        // Env var takes precedence.
        let p = dir.path().join("custom.toml");
        fs::write(&p, "alpha = 0.4\n").unwrap();
        std::env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = load_config_default().unwrap();
        assert!((cfg.alpha - 0.4).abs() < 1e-12);
        std::env::remove_var(ENV_CONFIG_PATH);

        std::env::set_current_dir(&old).unwrap();
    }
}
