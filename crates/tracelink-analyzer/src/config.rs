//! Configuration for coverage analysis and gap reasoning

use crate::error::AnalyzerError;
use serde::{Deserialize, Serialize};

/// Lower bounds of the link confidence bands
///
/// A confidence at or above `high` is high; at or above `medium` is medium;
/// at or above `low` is low; anything below `low` is very low.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBands {
    /// Lower bound of the high band
    pub high: f64,

    /// Lower bound of the medium band
    pub medium: f64,

    /// Lower bound of the low band
    pub low: f64,
}

impl Default for ConfidenceBands {
    fn default() -> Self {
        Self {
            high: 0.60,
            medium: 0.40,
            low: 0.25,
        }
    }
}

/// Band a confidence falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// At or above the high bound
    High,
    /// Between the medium and high bounds
    Medium,
    /// Between the low and medium bounds
    Low,
    /// Below the low bound
    VeryLow,
}

impl ConfidenceBands {
    /// Classify a link confidence
    pub fn band(&self, confidence: f64) -> ConfidenceBand {
        if confidence >= self.high {
            ConfidenceBand::High
        } else if confidence >= self.medium {
            ConfidenceBand::Medium
        } else if confidence >= self.low {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::VeryLow
        }
    }
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Link quality bands
    pub confidence_bands: ConfidenceBands,

    /// Minimum similarity for a near-miss candidate in gap reasoning
    pub near_miss_threshold: f32,

    /// Near-miss candidates gathered per gap
    pub near_miss_top: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_bands: ConfidenceBands::default(),
            near_miss_threshold: 0.35,
            near_miss_top: 3,
        }
    }
}

impl AnalysisConfig {
    /// Higher bands, fewer near misses
    pub fn strict() -> Self {
        Self {
            confidence_bands: ConfidenceBands {
                high: 0.70,
                medium: 0.50,
                low: 0.30,
            },
            near_miss_threshold: 0.45,
            near_miss_top: 3,
        }
    }

    /// Lower bands, more near misses
    pub fn permissive() -> Self {
        Self {
            confidence_bands: ConfidenceBands {
                high: 0.50,
                medium: 0.30,
                low: 0.20,
            },
            near_miss_threshold: 0.25,
            near_miss_top: 5,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        let bands = &self.confidence_bands;
        for (name, value) in [
            ("confidence_bands.high", bands.high),
            ("confidence_bands.medium", bands.medium),
            ("confidence_bands.low", bands.low),
            ("near_miss_threshold", f64::from(self.near_miss_threshold)),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalyzerError::Config(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if !(bands.low <= bands.medium && bands.medium <= bands.high) {
            return Err(AnalyzerError::Config(format!(
                "confidence bands must satisfy low <= medium <= high, got {} / {} / {}",
                bands.low, bands.medium, bands.high
            )));
        }
        if self.near_miss_top == 0 {
            return Err(AnalyzerError::Config(
                "near_miss_top must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, AnalyzerError> {
        toml::from_str(toml_str)
            .map_err(|e| AnalyzerError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, AnalyzerError> {
        toml::to_string_pretty(self)
            .map_err(|e| AnalyzerError::Config(format!("Failed to serialize TOML: {}", e)))
    }
}
