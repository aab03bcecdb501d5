//! Quality gates for orchestration operations
//! Typed operations, independent compliance checks and the blocking validator

pub mod checks;
pub mod operations;
pub mod types;
pub mod validator;

pub use checks::{default_checks, find_placeholder, CheckContext, QualityCheck, KNOWN_TEST_WORKSPACE_ID};
pub use operations::{Operation, OperationFields, OperationKind};
pub use types::{CheckEntry, CheckOutcome, ComplianceReport, QualityAlert, Severity};
pub use validator::{QualityConfig, QualityGateValidator};
