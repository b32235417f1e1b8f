//! # Run Configuration
//!
//! Optional TOML file holding the parameters of a run. Command line flags
//! override whatever the file sets.
//!
//! ```toml
//! [testability]
//! alpha = 0.05
//! n1 = 15
//! n2 = 44
//! strategy = "early-termination"
//!
//! [limits]
//! min_nodes = 0
//! max_nodes = 6
//!
//! [boost]
//! objective = "2-class"
//! max_ranked = 10
//! labels = [1, 1, -1]
//! ```

use serde::Deserialize;
use sigspan_core::primitives::DEFAULT_ALPHA;
use sigspan_core::{BoostConfig, Frequency, MinerConfig, SigspanError, Strategy};
use std::path::Path;

/// Maximum size of a configuration file (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Everything a run can be configured with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub testability: TestabilityConfig,
    pub limits: MinerConfig,
    pub boost: BoostConfig,
}

/// The `[testability]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestabilityConfig {
    pub alpha: f64,
    /// Graphs in the class of interest.
    pub n1: Option<Frequency>,
    /// All other graphs.
    pub n2: Option<Frequency>,
    pub strategy: Strategy,
}

impl Default for TestabilityConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            n1: None,
            n2: None,
            strategy: Strategy::default(),
        }
    }
}

impl TestabilityConfig {
    /// Class sizes: explicit values first, else counted from per-graph
    /// `labels` (`+1` → n1, `-1` → n2).
    pub fn class_sizes(&self, labels: &[i8]) -> Result<(Frequency, Frequency), SigspanError> {
        match (self.n1, self.n2) {
            (Some(n1), Some(n2)) => Ok((n1, n2)),
            _ if !labels.is_empty() => {
                let n1 = labels.iter().filter(|&&l| l > 0).count() as Frequency;
                let n2 = labels.len() as Frequency - n1;
                Ok((self.n1.unwrap_or(n1), self.n2.unwrap_or(n2)))
            }
            _ => Err(SigspanError::InvalidConfig(
                "class sizes unknown: set n1 and n2 or provide labels".to_string(),
            )),
        }
    }
}

impl RunConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SigspanError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| SigspanError::InvalidConfig(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, SigspanError> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| SigspanError::IoError(format!("Cannot read config metadata: {}", e)))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(SigspanError::InvalidConfig(format!(
                "config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path)
            .map_err(|e| SigspanError::IoError(format!("Read config: {}", e)))?;
        tracing::debug!(path = %path.display(), "loaded run configuration");
        Self::from_toml_str(&text)
    }

    /// Checks that do not depend on the database.
    pub fn validate(&self) -> Result<(), SigspanError> {
        let alpha = self.testability.alpha;
        if !(alpha.is_finite() && alpha > 0.0 && alpha < 1.0) {
            return Err(SigspanError::InvalidConfig(format!(
                "alpha must lie in (0, 1), got {}",
                alpha
            )));
        }
        if let Some(max) = self.limits.max_nodes
            && max <= self.limits.min_nodes
        {
            tracing::warn!(
                min_nodes = self.limits.min_nodes,
                max_nodes = max,
                "max_nodes is not above min_nodes and will be ignored"
            );
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sigspan_core::Objective;

    #[test]
    fn empty_file_gives_defaults() {
        let config = RunConfig::from_toml_str("").expect("parse");
        assert_eq!(config, RunConfig::default());
        assert!((config.testability.alpha - DEFAULT_ALPHA).abs() < f64::EPSILON);
    }

    #[test]
    fn full_file() {
        let config = RunConfig::from_toml_str(
            r#"
            [testability]
            alpha = 0.01
            n1 = 15
            n2 = 44
            strategy = "bisection"

            [limits]
            min_nodes = 2
            max_nodes = 5

            [boost]
            objective = "2-class"
            max_ranked = 3
            labels = [1, -1]
            "#,
        )
        .expect("parse");

        assert_eq!(config.testability.strategy, Strategy::Bisection);
        assert_eq!(config.testability.n1, Some(15));
        assert_eq!(config.limits.max_nodes, Some(5));
        assert_eq!(config.boost.objective, Objective::TwoClass);
        assert_eq!(config.boost.labels, vec![1, -1]);
    }

    #[test]
    fn unknown_key_rejected() {
        let result = RunConfig::from_toml_str("[testability]\nbeta = 1\n");
        assert!(matches!(result, Err(SigspanError::InvalidConfig(_))));
    }

    #[test]
    fn alpha_out_of_range_rejected() {
        let result = RunConfig::from_toml_str("[testability]\nalpha = 1.5\n");
        assert!(matches!(result, Err(SigspanError::InvalidConfig(_))));
    }

    #[test]
    fn class_sizes_from_labels() {
        let config = TestabilityConfig::default();
        assert_eq!(config.class_sizes(&[1, 1, -1]).expect("sizes"), (2, 1));
        assert!(config.class_sizes(&[]).is_err());

        let explicit = TestabilityConfig {
            n1: Some(4),
            ..TestabilityConfig::default()
        };
        assert_eq!(explicit.class_sizes(&[1, -1, -1]).expect("sizes"), (4, 2));
    }
}
