//! Recovery system type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Top-level verdict for a failed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryDecision {
    Retry,
    Skip,
    Escalate,
    CircuitBreak,
}

impl RecoveryDecision {
    /// All decisions, in reporting order
    pub fn all() -> [RecoveryDecision; 4] {
        [
            RecoveryDecision::Retry,
            RecoveryDecision::Skip,
            RecoveryDecision::Escalate,
            RecoveryDecision::CircuitBreak,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryDecision::Retry => "RETRY",
            RecoveryDecision::Skip => "SKIP",
            RecoveryDecision::Escalate => "ESCALATE",
            RecoveryDecision::CircuitBreak => "CIRCUIT_BREAK",
        }
    }
}

impl fmt::Display for RecoveryDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer-grained recovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryStrategy {
    /// Retry straight away with the same setup
    ImmediateRetry,

    /// Retry after a fixed delay
    DelayedRetry,

    /// Retry with delay doubling per attempt
    ExponentialBackoff,

    /// Retry immediately with a different prompt or approach
    AlternativeApproach,

    /// Hand the task to another agent
    DifferentAgent,

    /// Surface to a human operator
    HumanEscalation,

    /// Drop the task
    SkipTask,

    /// Stop retrying this task
    CircuitBreak,
}

impl RecoveryStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStrategy::ImmediateRetry => "IMMEDIATE_RETRY",
            RecoveryStrategy::DelayedRetry => "DELAYED_RETRY",
            RecoveryStrategy::ExponentialBackoff => "EXPONENTIAL_BACKOFF",
            RecoveryStrategy::AlternativeApproach => "ALTERNATIVE_APPROACH",
            RecoveryStrategy::DifferentAgent => "DIFFERENT_AGENT",
            RecoveryStrategy::HumanEscalation => "HUMAN_ESCALATION",
            RecoveryStrategy::SkipTask => "SKIP_TASK",
            RecoveryStrategy::CircuitBreak => "CIRCUIT_BREAK",
        }
    }
}

impl fmt::Display for RecoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavioural class of a failure signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureClass {
    /// Timeouts, dropped connections, rate limits
    Transient,

    /// Guardrail trips and validation failures; recoverable with a new approach
    Guardrail,

    /// Task already done or no longer relevant
    Obsolete,

    /// Anything else; handled by confidence
    Generic,
}

/// Serializable form of a failure signature, used by configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSpec {
    /// Identifier reported as `error_pattern`
    pub pattern_id: String,

    /// Case-insensitive regexes; any match selects the signature
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Case-insensitive regexes that must all match as well
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<String>,

    /// Historical success rate of recovering from this failure, in [0, 1]
    pub historical_success_rate: f64,

    /// Behavioural class
    #[serde(default = "default_signature_class")]
    pub class: SignatureClass,
}

fn default_signature_class() -> SignatureClass {
    SignatureClass::Generic
}

/// Incoming failure event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoveryRequest {
    pub task_id: String,
    pub workspace_id: String,
    pub error_message: String,
    #[serde(default)]
    pub error_type: String,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub execution_stage: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl RecoveryRequest {
    /// Minimal request for the common case
    pub fn new(
        task_id: impl Into<String>,
        workspace_id: impl Into<String>,
        error_message: impl Into<String>,
        retry_count: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            workspace_id: workspace_id.into(),
            error_message: error_message.into(),
            retry_count,
            ..Default::default()
        }
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Text the pattern matcher scans: message plus error type
    pub fn match_text(&self) -> String {
        if self.error_type.is_empty() {
            self.error_message.clone()
        } else {
            format!("{} {}", self.error_type, self.error_message)
        }
    }
}

/// Structured reply from the optional AI semantic analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiFailureAnalysis {
    pub confidence: Option<f64>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub success_indicators: Vec<String>,
}

/// Output of one recovery decision; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAnalysisResult {
    pub analysis_id: Uuid,
    pub task_id: String,
    pub workspace_id: String,
    pub agent_id: Option<String>,
    pub recovery_decision: RecoveryDecision,
    pub recovery_strategy: RecoveryStrategy,
    pub confidence_score: f64,
    pub recommended_delay_seconds: f64,
    pub max_retry_attempts: u32,
    pub retry_count: u32,
    pub error_pattern: String,
    pub risk_factors: Vec<String>,
    pub success_indicators: Vec<String>,
    pub reasoning: String,
    pub ai_analysis_used: bool,
    pub analyzed_at: DateTime<Utc>,
    pub analysis_duration_ms: u64,
}

impl RecoveryAnalysisResult {
    /// Whether the orchestrator should schedule another attempt
    pub fn should_retry(&self) -> bool {
        self.recovery_decision == RecoveryDecision::Retry
    }
}
