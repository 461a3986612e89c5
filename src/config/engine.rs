use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use crate::difficulty::DifficultyConfig;
use crate::tasks::stage::{StageConfig, StreakThresholds};
use crate::tasks::task::TaskArchetype;

/// Tables and tunables for the engine. Built once and handed to a session;
/// nothing reads these from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Days until next review, indexed by mastery level
    pub review_intervals: Vec<u32>,
    pub difficulty: DifficultyConfig,
    pub stages: Vec<StageConfig>,
    pub streaks: StreakThresholds,
    /// Chance of drawing from the weak set when it is non-empty
    pub weak_topic_probability: f64,
    pub add_sub_max_attempts: u32,
    /// Mastery level counted as "learned" in reports
    pub mastered_level: u32,
    /// Units below this level are listed as struggling in reports
    pub struggling_below_level: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            review_intervals: vec![1, 3, 7, 14, 30],
            difficulty: DifficultyConfig::default(),
            stages: StageConfig::default_table(),
            streaks: StreakThresholds::default(),
            weak_topic_probability: 0.3,
            add_sub_max_attempts: 16,
            mastered_level: 2,
            struggling_below_level: 3,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("review interval table is empty")]
    EmptyIntervals,
    #[error("review interval at level {0} must be at least one day")]
    ZeroInterval(usize),
    #[error("stage table is empty")]
    EmptyStages,
    #[error("stage {stage} has an invalid range [{min}, {max}]")]
    InvalidRange { stage: usize, min: i32, max: i32 },
    #[error("stage {stage} allows sequences but its range [{min}, {max}] has fewer than four values")]
    SequenceRange { stage: usize, min: i32, max: i32 },
    #[error("stage {0} allows no task archetypes")]
    NoArchetypes(usize),
    #[error("difficulty thresholds out of order: medium {medium} > hard {hard}")]
    ThresholdOrder { medium: f64, hard: f64 },
    #[error("difficulty window must cover at least one day")]
    EmptyWindow,
    #[error("weak topic probability {0} is outside [0, 1]")]
    Probability(f64),
    #[error("streak thresholds must be positive")]
    StreakThresholds,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.review_intervals.is_empty() {
            return Err(ConfigError::EmptyIntervals);
        }
        if let Some(level) = self.review_intervals.iter().position(|d| *d == 0) {
            return Err(ConfigError::ZeroInterval(level));
        }
        if self.stages.is_empty() {
            return Err(ConfigError::EmptyStages);
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.min < 0 || stage.min > stage.max {
                return Err(ConfigError::InvalidRange { stage: i + 1, min: stage.min, max: stage.max });
            }
            if stage.archetypes.is_empty() {
                return Err(ConfigError::NoArchetypes(i + 1));
            }
            if stage.archetypes.contains(&TaskArchetype::Sequence) && stage.max - stage.min < 3 {
                return Err(ConfigError::SequenceRange { stage: i + 1, min: stage.min, max: stage.max });
            }
        }
        let d = &self.difficulty;
        if d.medium_threshold > d.hard_threshold {
            return Err(ConfigError::ThresholdOrder { medium: d.medium_threshold, hard: d.hard_threshold });
        }
        if d.window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if !(0.0..=1.0).contains(&self.weak_topic_probability) {
            return Err(ConfigError::Probability(self.weak_topic_probability));
        }
        if self.streaks.advance_at <= 0 || self.streaks.regress_at <= 0 {
            return Err(ConfigError::StreakThresholds);
        }
        Ok(())
    }

    pub fn max_stage(&self) -> u8 {
        self.stages.len().clamp(1, u8::MAX as usize) as u8
    }
}

/// Read and validate a TOML config file.
pub fn try_load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading engine config {:?}", path))?;
    let config: EngineConfig = toml::from_str(&content)
        .with_context(|| format!("parsing engine config {:?}", path))?;
    config.validate()
        .with_context(|| format!("validating engine config {:?}", path))?;
    Ok(config)
}

/// Config from `path`, or the defaults when the file is missing or unusable.
pub fn load_config(path: &Path) -> EngineConfig {
    if !path.exists() {
        tracing::debug!(path = ?path, "No engine config file, using defaults");
        return EngineConfig::default();
    }

    match try_load_config(path) {
        Ok(config) => {
            tracing::info!(path = ?path, "Loaded engine config");
            config
        }
        Err(e) => {
            tracing::warn!(path = ?path, error = %format!("{:#}", e), "Invalid engine config, using defaults");
            EngineConfig::default()
        }
    }
}
