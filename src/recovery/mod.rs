//! Failure recovery decisioning
//! Pattern matching, confidence calibration and the recovery decision engine

pub mod calibrator;
pub mod engine;
pub mod patterns;
pub mod types;

pub use calibrator::ConfidenceCalibrator;
pub use engine::{RecoveryConfig, RecoveryDecisionEngine, RecoveryHealth, RecoveryStats};
pub use patterns::{FailureSignature, PatternMatcher};
pub use types::{
    RecoveryAnalysisResult, RecoveryDecision, RecoveryRequest, RecoveryStrategy, SignatureClass,
    SignatureSpec,
};
