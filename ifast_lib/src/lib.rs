//! Library layer for iFast: configuration, on-disk credentials, the local
//! fasting record store, session handling, and progress helpers.
//!
//! Wraps the `ifast_api` crate with a file-backed token store, a SQLite
//! repository for offline records, input validation, and the daily
//! fasting and step summaries front ends display.

pub mod config;
pub mod db;
pub mod error;
pub mod progress;
pub mod session;
pub mod steps;
pub mod token_store;
pub mod validation;

pub use ifast_api;
pub use ifast_api::types;

pub use config::{Config, ConfigError, Environment};
pub use db::{Db, DbError};
pub use error::IfastError;
pub use progress::{fast_progress, format_duration, DaySummary};
pub use session::{SessionManager, SessionState, SignupOutcome};
pub use steps::{StaticStepProvider, StepCountProvider, StepSummary, STEP_GOAL};
pub use token_store::FileTokenStore;
