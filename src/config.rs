//! Generator configuration (`crmgen.yaml`).

use crate::codegen::{Dialect, EmitOptions};
use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;

/// Environment variable overriding the output dialect
pub const DIALECT_ENV: &str = "CRMGEN_DIALECT";
/// Environment variable overriding the metadata filter cap
pub const FILTER_CAP_ENV: &str = "CRMGEN_FILTER_CAP";

/// Settings consumed by the generation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub dialect: Dialect,

    /// Emit global option sets once per run instead of inside each entity
    #[serde(default = "default_consolidate")]
    pub consolidate_option_sets: bool,

    /// Maximum attribute-name filter terms per metadata request
    #[serde(default = "default_filter_cap")]
    pub filter_cap: usize,

    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_consolidate() -> bool {
    true
}

fn default_filter_cap() -> usize {
    200
}

fn default_namespace() -> String {
    "Xrm.Proxies".to_string()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            consolidate_option_sets: default_consolidate(),
            filter_cap: default_filter_cap(),
            namespace: default_namespace(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            GenerationError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.filter_cap == 0 {
            return Err(GenerationError::Config(
                "filter_cap must be greater than zero".to_string(),
            ));
        }

        if self.namespace.trim().is_empty() {
            return Err(GenerationError::Config("namespace is required".to_string()));
        }

        Ok(())
    }

    /// Apply overrides with precedence: CLI > environment > this config
    pub fn with_overrides(
        mut self,
        cli_dialect: Option<String>,
        cli_filter_cap: Option<usize>,
    ) -> Result<Self> {
        if let Some(dialect) = cli_dialect {
            self.dialect = dialect.parse()?;
            tracing::info!("Using dialect from CLI flag: {}", self.dialect);
        } else if let Ok(dialect) = std::env::var(DIALECT_ENV) {
            self.dialect = dialect.parse()?;
            tracing::info!("Using dialect from {}: {}", DIALECT_ENV, self.dialect);
        }

        if let Some(cap) = cli_filter_cap {
            self.filter_cap = cap;
        } else if let Ok(cap) = std::env::var(FILTER_CAP_ENV) {
            self.filter_cap = cap.trim().parse().map_err(|_| {
                GenerationError::Config(format!(
                    "{} must be an integer, got '{}'",
                    FILTER_CAP_ENV, cap
                ))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Filter cap as a non-zero count
    pub fn filter_cap(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.filter_cap).ok_or_else(|| {
            GenerationError::Config("filter_cap must be greater than zero".to_string())
        })
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            namespace: self.namespace.clone(),
            consolidate_option_sets: self.consolidate_option_sets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
dialect: typescript
consolidate_option_sets: false
filter_cap: 50
namespace: Contoso.Model
"#;
        let config: GeneratorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dialect, Dialect::TypeScript);
        assert!(!config.consolidate_option_sets);
        assert_eq!(config.filter_cap, 50);
        assert_eq!(config.emit_options().namespace, "Contoso.Model");
    }

    #[test]
    fn test_defaults() {
        let config: GeneratorConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.dialect, Dialect::CSharp);
        assert_eq!(config.filter_cap, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let config = GeneratorConfig {
            filter_cap: 0,
            ..GeneratorConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::Config(_))));
        assert!(config.filter_cap().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let config = GeneratorConfig::default()
            .with_overrides(Some("ts".to_string()), Some(25))
            .unwrap();
        assert_eq!(config.dialect, Dialect::TypeScript);
        assert_eq!(config.filter_cap, 25);

        let err = GeneratorConfig::default()
            .with_overrides(None, Some(0))
            .unwrap_err();
        assert!(matches!(err, GenerationError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crmgen.yaml");
        std::fs::write(&path, "filter_cap: 10\n").unwrap();

        let config = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(config.filter_cap, 10);
        assert!(GeneratorConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }
}
