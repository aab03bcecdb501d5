//! Recovery decision engine
//!
//! One-shot classification of a failed task into RETRY, SKIP, ESCALATE or
//! CIRCUIT_BREAK. Rules are evaluated in order:
//!
//! 1. `retry_count == 0`             → RETRY (first failure always gets a chance)
//! 2. `retry_count >= max_attempts`  → CIRCUIT_BREAK, `max_retry_attempts = 0`
//! 3. transient signature            → RETRY, delay `min(2^retry_count, max_backoff)`
//! 4. guardrail signature            → RETRY immediately with a different approach
//! 5. obsolete signature             → SKIP
//! 6. calibrated confidence < threshold → ESCALATE
//! 7. otherwise                      → RETRY (different agent from the second retry on)
//!
//! Only rules 6 and 7 depend on confidence, so the optional AI analysis is
//! consulted only when neither of rules 1–5 fired.

use crate::ai::{self, CompletionProvider};
use crate::errors::{PolicyError, Result};
use crate::history::BoundedHistory;
use crate::recovery::calibrator::ConfidenceCalibrator;
use crate::recovery::patterns::{FailureSignature, PatternMatcher, UNKNOWN_PATTERN_ID};
use crate::recovery::types::{
    AiFailureAnalysis, RecoveryAnalysisResult, RecoveryDecision, RecoveryRequest,
    RecoveryStrategy, SignatureClass, SignatureSpec,
};
use crate::telemetry::{AiOutcome, Component, TelemetryCollector, TelemetryEvent};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default AI deadline when none is configured
const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(15);

/// Recovery engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Attempts after which the circuit breaks
    pub max_attempts_per_task: u32,

    /// Calibrated confidence below which failures escalate
    pub confidence_threshold: f64,

    /// Rolling history size
    pub history_capacity: usize,

    /// Delay for delayed retries and different-agent retries
    pub base_retry_delay_secs: f64,

    /// Upper bound of exponential backoff
    pub max_backoff_secs: f64,

    /// Consult the AI provider for semantic analysis
    pub ai_analysis_enabled: bool,

    /// Signature table; empty selects the built-in table
    pub signatures: Vec<SignatureSpec>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_task: 3,
            confidence_threshold: 0.3,
            history_capacity: 1000,
            base_retry_delay_secs: 5.0,
            max_backoff_secs: 60.0,
            ai_analysis_enabled: true,
            signatures: Vec::new(),
        }
    }
}

/// Aggregates over the in-memory analysis history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveryStats {
    pub workspace_id: Option<String>,
    pub total_analyses: usize,
    pub decisions: BTreeMap<String, usize>,
    pub patterns: BTreeMap<String, usize>,
    pub ai_usage_rate: f64,
    pub average_confidence: f64,
    pub average_duration_ms: f64,
}

/// Component availability snapshot
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryHealth {
    pub status: String,
    pub pattern_signatures: usize,
    pub ai_provider: Option<String>,
    pub ai_analysis_enabled: bool,
    pub history_size: usize,
    pub history_capacity: usize,
    pub ai_calls: usize,
    pub ai_failures: usize,
    pub average_ai_latency_ms: f64,
    pub average_analysis_latency_ms: f64,
}

/// Decision before it is stamped into a result
#[derive(Debug, Clone, PartialEq)]
struct Verdict {
    decision: RecoveryDecision,
    strategy: RecoveryStrategy,
    delay_secs: f64,
    max_retry_attempts: u32,
    reasoning: String,
}

/// Recovery decision engine
pub struct RecoveryDecisionEngine {
    config: RecoveryConfig,
    matcher: PatternMatcher,
    calibrator: ConfidenceCalibrator,
    ai: Option<Arc<dyn CompletionProvider>>,
    ai_timeout: Duration,
    history: BoundedHistory<RecoveryAnalysisResult>,
    telemetry: TelemetryCollector,
}

impl RecoveryDecisionEngine {
    /// Create engine with default configuration and a fresh history
    pub fn new() -> Self {
        let config = RecoveryConfig::default();
        let history = BoundedHistory::new(config.history_capacity);
        Self {
            config,
            matcher: PatternMatcher::new(),
            calibrator: ConfidenceCalibrator::new(),
            ai: None,
            ai_timeout: DEFAULT_AI_TIMEOUT,
            history,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Create engine with custom configuration and an injected history
    pub fn with_config(
        config: RecoveryConfig,
        history: BoundedHistory<RecoveryAnalysisResult>,
    ) -> Result<Self> {
        let matcher = PatternMatcher::from_specs(&config.signatures)?;
        Ok(Self {
            config,
            matcher,
            calibrator: ConfidenceCalibrator::new(),
            ai: None,
            ai_timeout: DEFAULT_AI_TIMEOUT,
            history,
            telemetry: TelemetryCollector::new(),
        })
    }

    /// Attach an AI provider for semantic analysis
    pub fn with_ai(mut self, provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        self.ai = Some(provider);
        self.ai_timeout = timeout;
        self
    }

    /// Share a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Analyze one failure event and record the result in the history
    pub async fn analyze(&self, request: &RecoveryRequest) -> Result<RecoveryAnalysisResult> {
        validate_request(request)?;
        let start = Instant::now();

        let signature = self.matcher.match_or_default(&request.match_text());
        let retry_count = request.retry_count;

        let mut confidence =
            self.calibrator
                .calibrate(signature.historical_success_rate, None, retry_count);
        let mut ai_analysis = None;

        let verdict = match self.decide_by_rules(retry_count, signature) {
            Some(verdict) => verdict,
            None => {
                if let Some(analysis) = self.semantic_analysis(request, signature).await {
                    confidence = self.calibrator.calibrate(
                        signature.historical_success_rate,
                        analysis.confidence,
                        retry_count,
                    );
                    ai_analysis = Some(analysis);
                }
                self.decide_by_confidence(retry_count, confidence)
            }
        };

        let (risk_factors, success_indicators) =
            build_indicators(request, signature, &verdict, confidence, ai_analysis.as_ref());

        let reasoning = match ai_analysis.as_ref().and_then(|a| a.root_cause.as_deref()) {
            Some(cause) if !cause.trim().is_empty() => {
                format!("{} Root cause: {}", verdict.reasoning, cause.trim())
            }
            _ => verdict.reasoning.clone(),
        };

        let result = RecoveryAnalysisResult {
            analysis_id: Uuid::new_v4(),
            task_id: request.task_id.clone(),
            workspace_id: request.workspace_id.clone(),
            agent_id: request.agent_id.clone(),
            recovery_decision: verdict.decision,
            recovery_strategy: verdict.strategy,
            confidence_score: confidence,
            recommended_delay_seconds: verdict.delay_secs,
            max_retry_attempts: verdict.max_retry_attempts,
            retry_count,
            error_pattern: signature.pattern_id.clone(),
            risk_factors,
            success_indicators,
            reasoning,
            ai_analysis_used: ai_analysis.is_some(),
            analyzed_at: Utc::now(),
            analysis_duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            task_id = %result.task_id,
            workspace_id = %result.workspace_id,
            decision = %result.recovery_decision,
            strategy = %result.recovery_strategy,
            pattern = %result.error_pattern,
            confidence = result.confidence_score,
            delay_secs = result.recommended_delay_seconds,
            ai_analysis_used = result.ai_analysis_used,
            "Recovery decision"
        );

        self.telemetry.record(TelemetryEvent::AnalysisCompleted {
            decision: result.recovery_decision.to_string(),
            duration_ms: result.analysis_duration_ms,
        });
        self.history.push(result.clone());

        Ok(result)
    }

    /// Analyze and report whether the task should be retried
    pub async fn should_recover(
        &self,
        request: &RecoveryRequest,
    ) -> Result<(bool, RecoveryAnalysisResult)> {
        let result = self.analyze(request).await?;
        Ok((result.should_retry(), result))
    }

    /// Rules that fire regardless of confidence
    fn decide_by_rules(&self, retry_count: u32, signature: &FailureSignature) -> Option<Verdict> {
        let max_attempts = self.config.max_attempts_per_task;

        if retry_count == 0 {
            let (strategy, delay_secs) = match signature.class {
                SignatureClass::Transient => {
                    (RecoveryStrategy::ExponentialBackoff, self.backoff_delay(0))
                }
                SignatureClass::Guardrail => (RecoveryStrategy::AlternativeApproach, 0.0),
                _ => (
                    RecoveryStrategy::DelayedRetry,
                    self.config.base_retry_delay_secs,
                ),
            };
            return Some(self.retry(
                strategy,
                delay_secs,
                retry_count,
                "First failure of this task; granting a retry.".to_string(),
            ));
        }

        if retry_count >= max_attempts {
            return Some(Verdict {
                decision: RecoveryDecision::CircuitBreak,
                strategy: RecoveryStrategy::CircuitBreak,
                delay_secs: 0.0,
                max_retry_attempts: 0,
                reasoning: format!(
                    "Task failed {} times, reaching the limit of {} attempts; breaking the circuit.",
                    retry_count, max_attempts
                ),
            });
        }

        match signature.class {
            SignatureClass::Transient => Some(self.retry(
                RecoveryStrategy::ExponentialBackoff,
                self.backoff_delay(retry_count),
                retry_count,
                "Transient failure (timeout, connection or rate limit); retrying with exponential backoff."
                    .to_string(),
            )),
            SignatureClass::Guardrail => Some(self.retry(
                RecoveryStrategy::AlternativeApproach,
                0.0,
                retry_count,
                "Guardrail or validation failure; retrying immediately with a different prompt/approach."
                    .to_string(),
            )),
            SignatureClass::Obsolete => Some(Verdict {
                decision: RecoveryDecision::Skip,
                strategy: RecoveryStrategy::SkipTask,
                delay_secs: 0.0,
                max_retry_attempts: 0,
                reasoning: "Task is already completed or no longer relevant; skipping.".to_string(),
            }),
            SignatureClass::Generic => None,
        }
    }

    /// Confidence-driven rules for generic failures
    fn decide_by_confidence(&self, retry_count: u32, confidence: f64) -> Verdict {
        if confidence < self.config.confidence_threshold {
            return Verdict {
                decision: RecoveryDecision::Escalate,
                strategy: RecoveryStrategy::HumanEscalation,
                delay_secs: 0.0,
                max_retry_attempts: 0,
                reasoning: format!(
                    "Recovery confidence {:.2} is below the threshold {:.2}; escalating to a human.",
                    confidence, self.config.confidence_threshold
                ),
            };
        }

        if retry_count >= 2 {
            self.retry(
                RecoveryStrategy::DifferentAgent,
                self.config.base_retry_delay_secs,
                retry_count,
                format!(
                    "Failed {} times with the same agent; reassigning to a different agent.",
                    retry_count
                ),
            )
        } else {
            self.retry(
                RecoveryStrategy::DelayedRetry,
                self.config.base_retry_delay_secs,
                retry_count,
                format!("Recovery confidence {:.2} supports a delayed retry.", confidence),
            )
        }
    }

    fn retry(
        &self,
        strategy: RecoveryStrategy,
        delay_secs: f64,
        retry_count: u32,
        reasoning: String,
    ) -> Verdict {
        Verdict {
            decision: RecoveryDecision::Retry,
            strategy,
            delay_secs,
            max_retry_attempts: self
                .config
                .max_attempts_per_task
                .saturating_sub(retry_count)
                .max(1),
            reasoning,
        }
    }

    /// `min(2^retry_count, max_backoff)` seconds
    fn backoff_delay(&self, retry_count: u32) -> f64 {
        2f64.powi(retry_count.min(62) as i32)
            .min(self.config.max_backoff_secs)
    }

    /// Ask the AI provider for a semantic read of the failure.
    /// Any failure leaves the decision on pattern confidence alone.
    async fn semantic_analysis(
        &self,
        request: &RecoveryRequest,
        signature: &FailureSignature,
    ) -> Option<AiFailureAnalysis> {
        if !self.config.ai_analysis_enabled {
            return None;
        }
        let provider = self.ai.as_ref()?;

        let prompt = build_analysis_prompt(request, signature);
        let start = Instant::now();
        let reply: Result<AiFailureAnalysis> =
            ai::complete_json_with_timeout(provider.as_ref(), &prompt, self.ai_timeout).await;

        let outcome = match &reply {
            Ok(_) => AiOutcome::Success,
            Err(PolicyError::AiTimeout { .. }) => AiOutcome::Timeout,
            Err(_) => AiOutcome::Failure,
        };
        self.telemetry
            .record_ai_call(Component::Recovery, outcome, start.elapsed());

        match reply {
            Ok(analysis) => match analysis.confidence {
                Some(c) if (0.0..=1.0).contains(&c) => Some(analysis),
                other => {
                    tracing::warn!(
                        task_id = %request.task_id,
                        confidence = ?other,
                        "AI analysis returned no usable confidence; using pattern confidence"
                    );
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    task_id = %request.task_id,
                    provider = provider.name(),
                    error = %e,
                    "AI failure analysis unavailable; using pattern confidence"
                );
                None
            }
        }
    }

    /// Aggregate statistics, optionally for one workspace
    pub fn stats(&self, workspace_id: Option<&str>) -> RecoveryStats {
        let entries = match workspace_id {
            Some(ws) => self.history.filtered(|r| r.workspace_id == ws),
            None => self.history.snapshot(),
        };

        let mut stats = RecoveryStats {
            workspace_id: workspace_id.map(str::to_string),
            total_analyses: entries.len(),
            ..Default::default()
        };
        for decision in RecoveryDecision::all() {
            stats.decisions.insert(decision.to_string(), 0);
        }
        if entries.is_empty() {
            return stats;
        }

        let mut ai_used = 0usize;
        let mut confidence_sum = 0.0;
        let mut duration_sum = 0u64;
        for entry in &entries {
            *stats
                .decisions
                .entry(entry.recovery_decision.to_string())
                .or_insert(0) += 1;
            *stats.patterns.entry(entry.error_pattern.clone()).or_insert(0) += 1;
            if entry.ai_analysis_used {
                ai_used += 1;
            }
            confidence_sum += entry.confidence_score;
            duration_sum += entry.analysis_duration_ms;
        }

        let n = entries.len() as f64;
        stats.ai_usage_rate = ai_used as f64 / n;
        stats.average_confidence = confidence_sum / n;
        stats.average_duration_ms = duration_sum as f64 / n;
        stats
    }

    /// Component availability and latency
    pub fn health(&self) -> RecoveryHealth {
        let telemetry = self.telemetry.get_stats();
        RecoveryHealth {
            status: "healthy".to_string(),
            pattern_signatures: self.matcher.signature_count(),
            ai_provider: self.ai.as_ref().map(|p| p.name().to_string()),
            ai_analysis_enabled: self.config.ai_analysis_enabled,
            history_size: self.history.len(),
            history_capacity: self.history.capacity(),
            ai_calls: telemetry.ai_calls,
            ai_failures: telemetry.ai_failures + telemetry.ai_timeouts,
            average_ai_latency_ms: telemetry.average_ai_latency_ms(),
            average_analysis_latency_ms: telemetry.average_analysis_latency_ms(),
        }
    }

    pub fn history(&self) -> &BoundedHistory<RecoveryAnalysisResult> {
        &self.history
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }
}

impl Default for RecoveryDecisionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_request(request: &RecoveryRequest) -> Result<()> {
    if request.task_id.trim().is_empty() {
        return Err(PolicyError::InvalidInput("task_id is required".to_string()));
    }
    if request.workspace_id.trim().is_empty() {
        return Err(PolicyError::InvalidInput("workspace_id is required".to_string()));
    }
    if request.error_message.trim().is_empty() {
        return Err(PolicyError::InvalidInput("error_message is required".to_string()));
    }
    Ok(())
}

fn build_analysis_prompt(request: &RecoveryRequest, signature: &FailureSignature) -> String {
    format!(
        r#"You are analyzing a failed task in an AI agent orchestration system.

TASK: {name}
DESCRIPTION: {description}
EXECUTION STAGE: {stage}
ERROR TYPE: {error_type}
ERROR MESSAGE: {message}
PREVIOUS RETRIES: {retries}
MATCHED FAILURE PATTERN: {pattern}

Estimate how likely a retry is to succeed. Respond with JSON only:
{{"confidence": <number 0.0-1.0>, "root_cause": "<one sentence>", "risk_factors": ["..."], "success_indicators": ["..."]}}"#,
        name = request.task_name.as_deref().unwrap_or("(unknown)"),
        description = request.task_description.as_deref().unwrap_or("(none)"),
        stage = request.execution_stage.as_deref().unwrap_or("(unknown)"),
        error_type = if request.error_type.is_empty() { "(unspecified)" } else { request.error_type.as_str() },
        message = request.error_message,
        retries = request.retry_count,
        pattern = signature.pattern_id,
    )
}

fn build_indicators(
    request: &RecoveryRequest,
    signature: &FailureSignature,
    verdict: &Verdict,
    confidence: f64,
    ai_analysis: Option<&AiFailureAnalysis>,
) -> (Vec<String>, Vec<String>) {
    let mut risks = Vec::new();
    let mut indicators = Vec::new();

    if request.retry_count >= 2 {
        risks.push(format!("Task has already failed {} times", request.retry_count));
    }
    if signature.pattern_id == UNKNOWN_PATTERN_ID {
        risks.push("Error does not match any known failure pattern".to_string());
    }
    if confidence < 0.5 {
        risks.push(format!("Low recovery confidence ({:.2})", confidence));
    }

    match signature.class {
        SignatureClass::Transient => {
            risks.push("Upstream dependency is unstable".to_string());
            indicators.push("Transient errors usually clear after backoff".to_string());
        }
        SignatureClass::Guardrail => {
            indicators.push("Use a different prompt/approach on the next attempt".to_string());
        }
        SignatureClass::Obsolete => {
            indicators.push("Task outcome already exists".to_string());
        }
        SignatureClass::Generic => {}
    }

    if verdict.strategy == RecoveryStrategy::DifferentAgent {
        indicators.push("A different agent may succeed where the current one failed".to_string());
    }

    if let Some(analysis) = ai_analysis {
        risks.extend(analysis.risk_factors.iter().cloned());
        indicators.extend(analysis.success_indicators.iter().cloned());
    }

    (risks, indicators)
}
