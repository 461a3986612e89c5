use serde::{Serialize, Deserialize};
use std::fmt;

/// Error type for the fallible edges of the engine (config, profile stores, logging).
/// Engine computations themselves are total and never produce one of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineError {
    pub message: String,
    pub stage: String,
    pub profile_id: Option<String>,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl EngineError {
    /// Create a new error with stage and message
    pub fn new<S: Into<String>>(message: S, stage: &'static str) -> Self {
        EngineError {
            message: message.into(),
            stage: stage.to_string(),
            profile_id: None,
            context: None,
            source: None,
        }
    }

    /// Attach the player profile the operation was working on
    pub fn with_profile<S: Into<String>>(mut self, profile_id: S) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    /// Add additional context information
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.stage == "not_found"
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if let Some(ref profile_id) = self.profile_id {
            write!(f, " (profile: {})", profile_id)?;
        }
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::new(
            format!("{:#}", err),
            "unknown"
        ).with_source("anyhow")
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::new(
            format!("I/O error: {}", err),
            "io"
        ).with_source("std::io")
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::new(
            format!("JSON error: {}", err),
            "json_parse"
        ).with_source("serde_json")
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::new(
            format!("TOML error: {}", err),
            "config_parse"
        ).with_source("toml")
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        let stage = if err.is_timeout() { "timeout" } else { "http" };
        EngineError::new(
            format!("HTTP error: {}", err),
            stage
        ).with_source("reqwest")
    }
}
