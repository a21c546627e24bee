//! Gatekeeper configuration

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Weights of the four scored signals in the combined score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Embedding similarity weight
    pub embedding: f64,

    /// Keyword Jaccard weight
    pub keyword: f64,

    /// Quantity match weight (applied to 0 or 1)
    pub quantity: f64,

    /// Variable-name weight
    pub name: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            embedding: 0.45,
            keyword: 0.25,
            quantity: 0.15,
            name: 0.15,
        }
    }
}

impl ScoringWeights {
    /// Validate the weights
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        let all = [
            ("embedding", self.embedding),
            ("keyword", self.keyword),
            ("quantity", self.quantity),
            ("name", self.name),
        ];
        for (name, weight) in all {
            if !weight.is_finite() || weight < 0.0 {
                return Err(GatekeeperError::Config(format!(
                    "weights.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        if all.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(GatekeeperError::Config(
                "at least one scoring weight must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Additive boost for hierarchically related identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdBoostConfig {
    /// Apply the boost at all
    pub enabled: bool,

    /// Boost when one id is the implied parent of the other
    pub parent_match: f64,

    /// Boost when both ids share a numeric base
    pub shared_base: f64,
}

impl Default for IdBoostConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            parent_match: 0.3,
            shared_base: 0.2,
        }
    }
}

impl IdBoostConfig {
    /// Configuration with the boost switched off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Validate the boost values
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        for (name, value) in [("parent_match", self.parent_match), ("shared_base", self.shared_base)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GatekeeperError::Config(format!(
                    "id_boost.{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Thresholds of the two-tier quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    /// Floor on the combined score
    pub min_combined_score: f64,

    /// Keyword score that passes on its own
    pub strong_keyword: f64,

    /// Embedding similarity that passes on its own
    pub strong_embedding: f64,

    /// Embedding part of the combined strong pass
    pub combined_embedding: f64,

    /// Keyword part of the combined strong pass
    pub combined_keyword: f64,

    /// Moderate embedding signal
    pub moderate_embedding: f64,

    /// Moderate keyword signal
    pub moderate_keyword: f64,

    /// Moderate variable-name signal
    pub moderate_name: f64,

    /// Moderate id boost signal
    pub moderate_id_boost: f64,

    /// Moderate signals needed without a strong pass
    pub min_moderate_signals: usize,

    /// Maximum links kept per source artifact
    pub max_links_per_source: usize,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            min_combined_score: 0.05,
            strong_keyword: 0.20,
            strong_embedding: 0.30,
            combined_embedding: 0.20,
            combined_keyword: 0.12,
            moderate_embedding: 0.12,
            moderate_keyword: 0.05,
            moderate_name: 0.10,
            moderate_id_boost: 0.05,
            min_moderate_signals: 2,
            max_links_per_source: 15,
        }
    }
}

impl QualityGateConfig {
    /// Create a permissive configuration (a single moderate signal suffices)
    pub fn permissive() -> Self {
        Self {
            min_combined_score: 0.0,
            min_moderate_signals: 1,
            max_links_per_source: 25,
            ..Self::default()
        }
    }

    /// Create a strict configuration (stronger and more corroborated evidence)
    pub fn strict() -> Self {
        Self {
            min_combined_score: 0.15,
            strong_keyword: 0.30,
            strong_embedding: 0.45,
            combined_embedding: 0.30,
            combined_keyword: 0.20,
            moderate_embedding: 0.20,
            moderate_keyword: 0.10,
            moderate_name: 0.30,
            moderate_id_boost: 0.10,
            min_moderate_signals: 3,
            max_links_per_source: 10,
        }
    }

    /// Validate the thresholds
    pub fn validate(&self) -> Result<(), GatekeeperError> {
        let thresholds = [
            ("min_combined_score", self.min_combined_score),
            ("strong_keyword", self.strong_keyword),
            ("strong_embedding", self.strong_embedding),
            ("combined_embedding", self.combined_embedding),
            ("combined_keyword", self.combined_keyword),
            ("moderate_embedding", self.moderate_embedding),
            ("moderate_keyword", self.moderate_keyword),
            ("moderate_name", self.moderate_name),
            ("moderate_id_boost", self.moderate_id_boost),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(GatekeeperError::Config(format!(
                    "quality_gate.{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.min_moderate_signals == 0 || self.min_moderate_signals > 5 {
            return Err(GatekeeperError::Config(format!(
                "quality_gate.min_moderate_signals must be between 1 and 5, got {}",
                self.min_moderate_signals
            )));
        }
        if self.max_links_per_source == 0 {
            return Err(GatekeeperError::Config(
                "quality_gate.max_links_per_source must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
