//! HTTP API server for DueTask.
//!
//! # Responsibility
//! - Expose the task use-cases from `duetask_core` as a REST API.
//! - Own process configuration and startup for the backend.

pub mod api;
pub mod config;
pub mod error;

pub use api::{router, AppState};
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
