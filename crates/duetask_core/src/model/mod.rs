//! Task domain model shared by server and client.
//!
//! # Responsibility
//! - Define the canonical task record and its wire shape.
//! - Define create/patch payloads and due-time parsing helpers.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - `notified` is only ever flipped by the due-task watcher path.

pub mod due;
pub mod task;
