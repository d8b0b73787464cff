/// Configuration management for the data mesh service
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub logging: LoggingSettings,
    pub lineage: LineageSettings,
    pub quality: QualitySettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageSettings {
    pub max_impact_depth: usize,
    #[serde(default)]
    pub definitions: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySettings {
    pub default_domain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: "info".to_string(),
            },
            lineage: LineageSettings {
                max_impact_depth: 3,
                definitions: None,
            },
            quality: QualitySettings {
                default_domain: "default".to_string(),
            },
            metrics: MetricsSettings { enabled: false },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse configuration file")?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Override fields with environment variables if present
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("DATA_MESH_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(depth) = std::env::var("DATA_MESH_MAX_IMPACT_DEPTH") {
            self.lineage.max_impact_depth = depth
                .parse()
                .context("DATA_MESH_MAX_IMPACT_DEPTH must be a positive integer")?;
        }

        if let Ok(path) = std::env::var("DATA_MESH_DEFINITIONS") {
            self.lineage.definitions = Some(PathBuf::from(path));
        }

        if let Ok(enabled) = std::env::var("DATA_MESH_METRICS_ENABLED") {
            self.metrics.enabled = enabled
                .parse()
                .context("DATA_MESH_METRICS_ENABLED must be true or false")?;
        }

        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge_with(&mut self, other: Config) {
        let defaults = Config::default();

        if other.logging.level != defaults.logging.level {
            self.logging.level = other.logging.level;
        }
        if other.lineage.max_impact_depth != defaults.lineage.max_impact_depth {
            self.lineage.max_impact_depth = other.lineage.max_impact_depth;
        }
        if other.lineage.definitions.is_some() {
            self.lineage.definitions = other.lineage.definitions;
        }
        if other.quality.default_domain != defaults.quality.default_domain {
            self.quality.default_domain = other.quality.default_domain;
        }
        if other.metrics.enabled {
            self.metrics.enabled = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.lineage.max_impact_depth == 0 {
            return Err(anyhow::anyhow!("Max impact depth must be greater than 0"));
        }

        EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("Invalid log level: {}", self.logging.level))?;

        if self.quality.default_domain.trim().is_empty() {
            return Err(anyhow::anyhow!("Default quality domain must not be empty"));
        }

        Ok(())
    }
}
