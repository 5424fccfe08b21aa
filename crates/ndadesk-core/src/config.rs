//! Desk configuration, passed explicitly to every component that needs it.
//!
//! Loaded from a JSON file; any field left out takes its default, so an empty
//! object `{}` is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::quality::{MAX_SCORE, QualityReport};

/// Longest accepted SLA window (ten years).
pub const MAX_SLA_HOURS: u32 = 10 * 365 * 24;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level desk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Hours from receipt until a review thread is due.
    pub sla_hours: u32,
    /// Log a warning for every document scoring below `quality_threshold`.
    pub enable_alerts: bool,
    /// Scores strictly below this are flagged for rework.
    pub quality_threshold: u32,
    /// Row cap for thread listings.
    pub max_threads_display: usize,
    pub intake: IntakeConfig,
    /// Section keywords every executed NDA must mention.
    pub compliance_sections: Vec<String>,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            sla_hours: 24,
            enable_alerts: true,
            quality_threshold: 80,
            max_threads_display: 100,
            intake: IntakeConfig::default(),
            compliance_sections: vec![
                "confidential".into(),
                "agreement".into(),
                "parties".into(),
            ],
        }
    }
}

/// Keyword lists used to triage incoming email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Subject keywords marking an NDA request (matched lowercase).
    pub nda_keywords: Vec<String>,
    /// Subject keyword raising priority to high (matched lowercase).
    pub urgent_keyword: String,
    /// Known client names, checked in order.
    pub clients: Vec<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            nda_keywords: vec!["nda".into(), "agreement".into(), "confidential".into()],
            urgent_keyword: "urgent".into(),
            clients: vec!["Acme Corp".into(), "TechCo".into(), "GlobalTrade".into()],
        }
    }
}

impl DeskConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;
        info!(path = %path.display(), "loaded desk config");
        Ok(config)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: DeskConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sla_hours == 0 {
            return Err(ConfigError::Invalid("sla_hours must be at least 1".into()));
        }
        if self.sla_hours > MAX_SLA_HOURS {
            return Err(ConfigError::Invalid(format!(
                "sla_hours {} exceeds maximum {MAX_SLA_HOURS}",
                self.sla_hours
            )));
        }
        if self.quality_threshold > MAX_SCORE {
            return Err(ConfigError::Invalid(format!(
                "quality_threshold {} exceeds maximum score {MAX_SCORE}",
                self.quality_threshold
            )));
        }
        if self.intake.urgent_keyword.trim().is_empty() {
            return Err(ConfigError::Invalid("urgent_keyword must not be empty".into()));
        }
        Ok(())
    }

    /// SLA window as a duration.
    pub fn sla(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.sla_hours))
    }

    /// Whether a report falls below the rework threshold.
    pub fn needs_rework(&self, report: &QualityReport) -> bool {
        report.score < self.quality_threshold
    }
}
