//! Quality gate validator
//! Runs every check, scores compliance and decides whether the operation may proceed

use crate::history::BoundedHistory;
use crate::quality::checks::{default_checks, CheckContext, QualityCheck, KNOWN_TEST_WORKSPACE_ID};
use crate::quality::operations::Operation;
use crate::quality::types::{CheckEntry, CheckOutcome, ComplianceReport, QualityAlert, Severity};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Quality gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Workspace ids that must never appear in a payload
    pub hardcoded_workspace_ids: Vec<String>,

    /// Blocking validations kept for the alerts endpoint
    pub alert_history_capacity: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            hardcoded_workspace_ids: vec![KNOWN_TEST_WORKSPACE_ID.to_string()],
            alert_history_capacity: 200,
        }
    }
}

/// Quality gate validator
pub struct QualityGateValidator {
    checks: Vec<Box<dyn QualityCheck>>,
    alerts: BoundedHistory<QualityAlert>,
    telemetry: TelemetryCollector,
}

impl QualityGateValidator {
    /// Create validator with default configuration
    pub fn new() -> Self {
        let config = QualityConfig::default();
        let alerts = BoundedHistory::new(config.alert_history_capacity);
        Self::with_config(&config, alerts)
    }

    /// Create validator with custom configuration and an injected alert history
    pub fn with_config(config: &QualityConfig, alerts: BoundedHistory<QualityAlert>) -> Self {
        Self {
            checks: default_checks(config.hardcoded_workspace_ids.clone()),
            alerts,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Replace the check list
    pub fn with_checks(mut self, checks: Vec<Box<dyn QualityCheck>>) -> Self {
        self.checks = checks;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Validate one operation. Returns whether it may proceed and the full report.
    pub fn validate(&self, operation: &Operation, workspace_id: &str) -> (bool, ComplianceReport) {
        let ctx = CheckContext {
            operation,
            workspace_id,
        };

        let mut checks_passed = Vec::new();
        let mut checks_failed = Vec::new();
        let mut blocking_issues = Vec::new();

        for check in &self.checks {
            let outcome = run_check(check.as_ref(), &ctx);
            let entry = CheckEntry {
                check: check.name().to_string(),
                message: outcome.message,
            };

            if outcome.passed {
                checks_passed.push(entry);
            } else {
                if check.severity() == Severity::Critical {
                    blocking_issues.push(format!("{}: {}", entry.check, entry.message));
                }
                checks_failed.push(entry);
            }
        }

        let compliance_score = compliance_score(checks_passed.len(), self.checks.len());
        let can_proceed = blocking_issues.is_empty();

        let report = ComplianceReport {
            operation_type: operation.kind().to_string(),
            workspace_id: workspace_id.to_string(),
            checks_passed,
            checks_failed,
            compliance_score,
            blocking_issues,
            can_proceed,
            validated_at: Utc::now(),
        };

        if can_proceed {
            tracing::debug!(
                workspace_id,
                operation_type = %report.operation_type,
                compliance_score,
                "Quality gates passed"
            );
        } else {
            tracing::warn!(
                workspace_id,
                operation_type = %report.operation_type,
                compliance_score,
                blocking_issues = ?report.blocking_issues,
                "Quality gates blocked operation"
            );
            self.alerts.push(QualityAlert::from_report(&report));
        }

        self.telemetry.record(TelemetryEvent::ValidationCompleted {
            compliance_score,
            blocking: !can_proceed,
        });

        (can_proceed, report)
    }

    /// Most recent blocking alerts, newest last, optionally for one workspace
    pub fn alerts(&self, workspace_id: Option<&str>, limit: usize) -> Vec<QualityAlert> {
        let alerts = match workspace_id {
            Some(ws) => self.alerts.filtered(|a| a.workspace_id == ws),
            None => self.alerts.snapshot(),
        };
        let skip = alerts.len().saturating_sub(limit);
        alerts.into_iter().skip(skip).collect()
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }
}

impl Default for QualityGateValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one check, turning errors and panics into a failed outcome
fn run_check(check: &dyn QualityCheck, ctx: &CheckContext<'_>) -> CheckOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| check.evaluate(ctx))) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::warn!(check = check.name(), error = %e, "Quality check errored");
            CheckOutcome::fail(format!("check error: {}", e))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(check = check.name(), error = %message, "Quality check panicked");
            CheckOutcome::fail(format!("check error: {}", message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// `floor(100 * passed / total)`
fn compliance_score(passed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (passed * 100 / total).min(100) as u8
}
