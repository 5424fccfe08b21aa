//! Core types, quality-annotation parsing, and shared configuration for ndadesk.

pub mod config;
pub mod intake;
pub mod kpi;
pub mod quality;
pub mod schema;
pub mod screen;
pub mod util;

pub use config::{ConfigError, DeskConfig, IntakeConfig};
pub use intake::{EmailMessage, ReviewThread, ThreadIntake, ThreadStatus};
pub use quality::{IssueCategory, IssueOccurrence, QualityBand, QualityReport, parse};
pub use schema::review;
