//! Quality gate type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a failed check affects the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Failure blocks the operation
    Critical,

    /// Failure only lowers the compliance score
    Advisory,
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Check does not apply to this operation type
    pub fn not_applicable() -> Self {
        Self::pass("not applicable")
    }
}

/// A check name and its message, as reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub check: String,
    pub message: String,
}

/// Output of the quality gate validator for one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub operation_type: String,
    pub workspace_id: String,
    pub checks_passed: Vec<CheckEntry>,
    pub checks_failed: Vec<CheckEntry>,

    /// `floor(100 * passed / total)`
    pub compliance_score: u8,

    /// Failed critical checks; empty iff the operation may proceed
    pub blocking_issues: Vec<String>,
    pub can_proceed: bool,
    pub validated_at: DateTime<Utc>,
}

impl ComplianceReport {
    pub fn total_checks(&self) -> usize {
        self.checks_passed.len() + self.checks_failed.len()
    }
}

/// A blocking validation kept for the alerts endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAlert {
    pub alert_id: Uuid,
    pub workspace_id: String,
    pub operation_type: String,
    pub compliance_score: u8,
    pub blocking_issues: Vec<String>,
    pub raised_at: DateTime<Utc>,
}

impl QualityAlert {
    pub fn from_report(report: &ComplianceReport) -> Self {
        Self {
            alert_id: Uuid::new_v4(),
            workspace_id: report.workspace_id.clone(),
            operation_type: report.operation_type.clone(),
            compliance_score: report.compliance_score,
            blocking_issues: report.blocking_issues.clone(),
            raised_at: report.validated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_applicable_passes() {
        let outcome = CheckOutcome::not_applicable();
        assert!(outcome.passed);
        assert_eq!(outcome.message, "not applicable");
    }

    #[test]
    fn test_alert_copies_report() {
        let report = ComplianceReport {
            operation_type: "recovery".to_string(),
            workspace_id: "ws-1".to_string(),
            checks_passed: vec![],
            checks_failed: vec![CheckEntry {
                check: "multi_tenant".to_string(),
                message: "workspace_id is empty".to_string(),
            }],
            compliance_score: 0,
            blocking_issues: vec!["multi_tenant: workspace_id is empty".to_string()],
            can_proceed: false,
            validated_at: Utc::now(),
        };
        let alert = QualityAlert::from_report(&report);
        assert_eq!(alert.workspace_id, "ws-1");
        assert_eq!(alert.blocking_issues, report.blocking_issues);
        assert_eq!(report.total_checks(), 1);
    }
}
