//! Task execution classification
//! Tool-aware execution typing with a keyword fallback

pub mod engine;
pub mod heuristics;
pub mod types;

pub use engine::TaskExecutionClassifier;
pub use heuristics::{classify_by_keywords, detect_format, enforce_tool_availability};
pub use types::{OutputSpecificity, TaskExecutionClassification, TaskExecutionType, WorkspaceContext};
