//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the task API use-cases.
//! - Keep HTTP and client layers decoupled from storage details.

pub mod task_service;
