use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{HorizonFactors, ScoringParams};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotSettings {
    /// JSON snapshot loaded at startup; the service starts empty without one
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_top_k")]
    pub default_top_k: u16,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: u16,
    #[serde(default)]
    pub min_score: u8,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            min_score: 0,
        }
    }
}

fn default_top_k() -> u16 { 5 }
fn default_max_top_k() -> u16 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default = "default_neutral_baseline")]
    pub neutral_baseline: f64,
    #[serde(default = "default_segment_bonus")]
    pub segment_bonus: f64,
    #[serde(default = "default_skill_scale_max")]
    pub skill_scale_max: f64,
    #[serde(default = "default_importance_scale_max")]
    pub importance_scale_max: f64,
    #[serde(default = "default_urgency_scale_max")]
    pub urgency_scale_max: f64,
    #[serde(default)]
    pub horizon: HorizonFactors,
    #[serde(default)]
    pub explanation: ExplanationConfig,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            neutral_baseline: default_neutral_baseline(),
            segment_bonus: default_segment_bonus(),
            skill_scale_max: default_skill_scale_max(),
            importance_scale_max: default_importance_scale_max(),
            urgency_scale_max: default_urgency_scale_max(),
            horizon: HorizonFactors::default(),
            explanation: ExplanationConfig::default(),
        }
    }
}

fn default_neutral_baseline() -> f64 { 50.0 }
fn default_segment_bonus() -> f64 { 1.1 }
fn default_skill_scale_max() -> f64 { 10.0 }
fn default_importance_scale_max() -> f64 { 5.0 }
fn default_urgency_scale_max() -> f64 { 5.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationConfig {
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: f64,
    #[serde(default = "default_weak_threshold")]
    pub weak_threshold: f64,
    #[serde(default = "default_min_weight_share")]
    pub min_weight_share: f64,
    #[serde(default = "default_max_items")]
    pub max_drivers: usize,
    #[serde(default = "default_max_items")]
    pub max_gaps: usize,
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            strong_threshold: default_strong_threshold(),
            weak_threshold: default_weak_threshold(),
            min_weight_share: default_min_weight_share(),
            max_drivers: default_max_items(),
            max_gaps: default_max_items(),
        }
    }
}

fn default_strong_threshold() -> f64 { 0.7 }
fn default_weak_threshold() -> f64 { 0.4 }
fn default_min_weight_share() -> f64 { 0.05 }
fn default_max_items() -> usize { 3 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ADVISOR_MATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ADVISOR_MATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("ADVISOR_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ADVISOR_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.scoring_params().validate().map_err(ConfigError::Message)?;
        let matching = &self.matching;
        if matching.default_top_k == 0 || matching.default_top_k > matching.max_top_k {
            return Err(ConfigError::Message(format!(
                "matching.default_top_k {} must be within 1..={}",
                self.matching.default_top_k, self.matching.max_top_k
            )));
        }
        Ok(())
    }

    /// Engine parameters assembled from the scoring and matching sections
    pub fn scoring_params(&self) -> ScoringParams {
        let scoring = &self.scoring;
        ScoringParams {
            neutral_baseline: scoring.neutral_baseline,
            segment_bonus: scoring.segment_bonus,
            skill_scale_max: scoring.skill_scale_max,
            importance_scale_max: scoring.importance_scale_max,
            urgency_scale_max: scoring.urgency_scale_max,
            horizon: scoring.horizon,
            strong_threshold: scoring.explanation.strong_threshold,
            weak_threshold: scoring.explanation.weak_threshold,
            min_weight_share: scoring.explanation.min_weight_share,
            max_drivers: scoring.explanation.max_drivers,
            max_gaps: scoring.explanation.max_gaps,
            min_score: self.matching.min_score,
        }
    }
}
