//! TaskGuard - decision layer for AI agent orchestration
//!
//! Three policy components sit between an orchestrator and its agents:
//!
//! - **Recovery**: classifies a failed task into retry, skip, escalate or
//!   circuit-break, with calibrated confidence and backoff
//! - **Classifier**: decides how a task must be executed given the tools
//!   that actually exist, never promising data collection without a real
//!   search tool
//! - **Quality gates**: scores an operation against independent compliance
//!   checks and blocks it when a critical check fails
//!
//! Every AI call is optional and bounded by a timeout; each component has a
//! deterministic local fallback.

pub mod errors;
pub mod history;
pub mod telemetry;

pub mod ai;
pub mod tools;
pub mod store;

pub mod recovery;
pub mod classifier;
pub mod quality;

pub mod cli;
pub mod config;
pub mod logging;
pub mod server;

// Re-export commonly used types
pub use errors::{PolicyError, Result};
