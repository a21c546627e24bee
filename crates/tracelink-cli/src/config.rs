//! Configuration management for the CLI.

use crate::cli::PresetArg;
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracelink_analyzer::AnalysisConfig;
use tracelink_linker::LinkingConfig;
use tracelink_llm::{LlmConfig, RateLimitConfig};

/// Configuration file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tracelink.toml";

/// Effective configuration, one table per concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Candidate generation, scoring and gate settings
    pub linking: LinkingConfig,

    /// LLM call throttling and retries
    pub rate_limit: RateLimitConfig,

    /// LLM provider connection
    pub llm: LlmConfig,

    /// Report bands and gap reasoning
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Files searched when no path is given, in order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("tracelink").join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the first file found in
    /// [`Config::search_paths`] is used, and defaults apply when there is
    /// none. Returns the file that was read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Configuration file {} does not exist",
                        path.display()
                    )));
                }
                Some(path.to_path_buf())
            }
            None => Self::search_paths().into_iter().find(|p| p.exists()),
        };

        match path {
            Some(path) => {
                let contents = fs::read_to_string(&path)?;
                let config = Self::from_toml(&contents)?;
                Ok((config, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }

    /// Parse and validate TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Validate every table.
    pub fn validate(&self) -> Result<()> {
        self.linking.validate()?;
        self.rate_limit
            .validate()
            .map_err(|e| CliError::Config(format!("[rate_limit] {}", e)))?;
        self.llm
            .validate()
            .map_err(|e| CliError::Config(format!("[llm] {}", e)))?;
        self.analysis.validate()?;
        Ok(())
    }

    /// Replace linking and analysis settings with a named preset.
    pub fn apply_preset(&mut self, preset: PresetArg) {
        let (linking, analysis) = match preset {
            PresetArg::Default => (LinkingConfig::default(), AnalysisConfig::default()),
            PresetArg::Strict => (LinkingConfig::strict(), AnalysisConfig::strict()),
            PresetArg::Permissive => (LinkingConfig::permissive(), AnalysisConfig::permissive()),
        };
        self.linking = linking;
        self.analysis = analysis;
    }
}
