//! Configuration for the layer linker

use crate::error::LinkerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracelink_domain::{ArtifactKind, LinkType};
use tracelink_gatekeeper::{IdBoostConfig, QualityGateConfig, ScoringWeights};

/// One oracle-assisted linking stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// `SYSTEM_REQ_DECOMPOSED → HLR`
    DecomposedToHlr,
    /// `HLR → LLR`
    HlrToLlr,
    /// `LLR → CODE_VAR`
    LlrToCodeVar,
}

impl Layer {
    /// Stages in execution order
    pub const ALL: [Layer; 3] = [Layer::DecomposedToHlr, Layer::HlrToLlr, Layer::LlrToCodeVar];

    /// Kind of the artifacts links start from
    pub fn source_kind(&self) -> ArtifactKind {
        match self {
            Layer::DecomposedToHlr => ArtifactKind::SystemReqDecomposed,
            Layer::HlrToLlr => ArtifactKind::Hlr,
            Layer::LlrToCodeVar => ArtifactKind::Llr,
        }
    }

    /// Kind of the artifacts links point to
    pub fn target_kind(&self) -> ArtifactKind {
        match self {
            Layer::DecomposedToHlr => ArtifactKind::Hlr,
            Layer::HlrToLlr => ArtifactKind::Llr,
            Layer::LlrToCodeVar => ArtifactKind::CodeVar,
        }
    }

    /// Type of the links this stage creates
    pub fn link_type(&self) -> LinkType {
        match self {
            Layer::LlrToCodeVar => LinkType::References,
            _ => LinkType::Implements,
        }
    }

    /// Whether the variable-name signal applies
    pub fn uses_name_signal(&self) -> bool {
        matches!(self, Layer::LlrToCodeVar)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source_kind(), self.target_kind())
    }
}

/// Per-stage confidence thresholds
///
/// Deeper layers default lower since their texts are shorter and share
/// fewer words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerThresholds {
    /// `SYSTEM_REQ_DECOMPOSED → HLR`
    pub decomposed_to_hlr: f64,
    /// `HLR → LLR`
    pub hlr_to_llr: f64,
    /// `LLR → CODE_VAR`
    pub llr_to_code_var: f64,
}

impl Default for LayerThresholds {
    fn default() -> Self {
        Self {
            decomposed_to_hlr: 0.28,
            hlr_to_llr: 0.25,
            llr_to_code_var: 0.23,
        }
    }
}

impl LayerThresholds {
    /// Threshold for one stage
    pub fn get(&self, layer: Layer) -> f64 {
        match layer {
            Layer::DecomposedToHlr => self.decomposed_to_hlr,
            Layer::HlrToLlr => self.hlr_to_llr,
            Layer::LlrToCodeVar => self.llr_to_code_var,
        }
    }
}

/// Configuration for the layer linker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    /// Lowest similarity requested from the oracle
    pub embedding_threshold: f64,

    /// Candidates kept per source (before the per-source link cap)
    pub top_k: usize,

    /// Candidate floor as a fraction of the layer threshold
    pub candidate_threshold_factor: f64,

    /// Candidates submitted to the adjudicator
    pub llm_max_candidates: usize,

    /// Lowest adjudicator confidence accepted
    pub llm_confidence_floor: f64,

    /// Candidates accepted when the adjudicator fails
    pub fallback_top_n: usize,

    /// Signal weights
    pub weights: ScoringWeights,

    /// Identifier hierarchy boost
    pub id_boost: IdBoostConfig,

    /// Per-stage thresholds
    pub layer_thresholds: LayerThresholds,

    /// Candidate quality gate
    pub quality_gate: QualityGateConfig,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            embedding_threshold: 0.10,
            top_k: 20,
            candidate_threshold_factor: 0.7,
            llm_max_candidates: 10,
            llm_confidence_floor: 0.6,
            fallback_top_n: 3,
            weights: ScoringWeights::default(),
            id_boost: IdBoostConfig::default(),
            layer_thresholds: LayerThresholds::default(),
            quality_gate: QualityGateConfig::default(),
        }
    }
}

impl LinkingConfig {
    /// Strict preset: higher thresholds, corroborated evidence only
    pub fn strict() -> Self {
        Self {
            llm_confidence_floor: 0.7,
            layer_thresholds: LayerThresholds {
                decomposed_to_hlr: 0.35,
                hlr_to_llr: 0.32,
                llr_to_code_var: 0.30,
            },
            quality_gate: QualityGateConfig::strict(),
            ..Self::default()
        }
    }

    /// Permissive preset: favour recall over precision
    pub fn permissive() -> Self {
        Self {
            embedding_threshold: 0.05,
            llm_confidence_floor: 0.5,
            fallback_top_n: 5,
            layer_thresholds: LayerThresholds {
                decomposed_to_hlr: 0.20,
                hlr_to_llr: 0.18,
                llr_to_code_var: 0.15,
            },
            quality_gate: QualityGateConfig::permissive(),
            ..Self::default()
        }
    }

    /// Lowest combined score a candidate needs in this stage
    pub fn candidate_floor(&self, layer: Layer) -> f64 {
        self.layer_thresholds.get(layer) * self.candidate_threshold_factor
    }

    /// Candidates kept per source after ranking
    pub fn max_candidates(&self) -> usize {
        self.top_k.min(self.quality_gate.max_links_per_source)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LinkerError> {
        let unit = [
            ("embedding_threshold", self.embedding_threshold),
            ("candidate_threshold_factor", self.candidate_threshold_factor),
            ("llm_confidence_floor", self.llm_confidence_floor),
            ("layer_thresholds.decomposed_to_hlr", self.layer_thresholds.decomposed_to_hlr),
            ("layer_thresholds.hlr_to_llr", self.layer_thresholds.hlr_to_llr),
            ("layer_thresholds.llr_to_code_var", self.layer_thresholds.llr_to_code_var),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(LinkerError::Config(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.top_k == 0 {
            return Err(LinkerError::Config("top_k must be greater than 0".to_string()));
        }
        if self.llm_max_candidates == 0 {
            return Err(LinkerError::Config(
                "llm_max_candidates must be greater than 0".to_string(),
            ));
        }
        if self.fallback_top_n == 0 {
            return Err(LinkerError::Config(
                "fallback_top_n must be greater than 0".to_string(),
            ));
        }
        self.weights.validate()?;
        self.id_boost.validate()?;
        self.quality_gate.validate()?;
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, LinkerError> {
        toml::from_str(toml_str)
            .map_err(|e| LinkerError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, LinkerError> {
        toml::to_string_pretty(self)
            .map_err(|e| LinkerError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LinkingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_candidates(), 15);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(LinkingConfig::strict().validate().is_ok());
        assert!(LinkingConfig::permissive().validate().is_ok());
    }

    #[test]
    fn test_candidate_floor() {
        let config = LinkingConfig::default();
        assert!((config.candidate_floor(Layer::DecomposedToHlr) - 0.196).abs() < 1e-9);
        assert!((config.candidate_floor(Layer::LlrToCodeVar) - 0.161).abs() < 1e-9);
    }

    #[test]
    fn test_deeper_layers_have_lower_thresholds() {
        let thresholds = LayerThresholds::default();
        assert!(thresholds.get(Layer::DecomposedToHlr) > thresholds.get(Layer::HlrToLlr));
        assert!(thresholds.get(Layer::HlrToLlr) > thresholds.get(Layer::LlrToCodeVar));
    }

    #[test]
    fn test_layer_kinds() {
        assert_eq!(Layer::HlrToLlr.source_kind(), ArtifactKind::Hlr);
        assert_eq!(Layer::HlrToLlr.target_kind(), ArtifactKind::Llr);
        assert_eq!(Layer::LlrToCodeVar.link_type(), LinkType::References);
        assert_eq!(Layer::DecomposedToHlr.link_type(), LinkType::Implements);
        assert!(Layer::LlrToCodeVar.uses_name_signal());
        assert_eq!(Layer::DecomposedToHlr.to_string(), "SYSTEM_REQ_DECOMPOSED->HLR");
    }

    #[test]
    fn test_invalid_config() {
        let mut config = LinkingConfig::default();
        config.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = LinkingConfig::default();
        config.layer_thresholds.hlr_to_llr = 1.2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("hlr_to_llr"));

        let mut config = LinkingConfig::default();
        config.quality_gate.min_moderate_signals = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LinkingConfig::strict();
        let toml_str = config.to_toml().unwrap();
        let parsed = LinkingConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml() {
        let config = LinkingConfig::from_toml(
            r#"
            top_k = 5

            [layer_thresholds]
            hlr_to_llr = 0.4

            [id_boost]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.top_k, 5);
        assert_eq!(config.max_candidates(), 5);
        assert_eq!(config.layer_thresholds.hlr_to_llr, 0.4);
        assert_eq!(config.layer_thresholds.decomposed_to_hlr, 0.28);
        assert!(!config.id_boost.enabled);
        assert_eq!(config.weights, ScoringWeights::default());
    }
}
