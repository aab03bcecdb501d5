//! Quality gate validation across operation types

use serde_json::json;
use taskguard::history::BoundedHistory;
use taskguard::quality::{Operation, QualityConfig, QualityGateValidator};

const HARDCODED_ID: &str = "f79d87cc-b61f-491d-9226-4220e39e71ad";

fn op(kind: &str, data: serde_json::Value) -> Operation {
    Operation::from_parts(kind, data).unwrap()
}

#[test]
fn hardcoded_workspace_id_blocks_and_raises_alert() {
    let alerts = BoundedHistory::new(10);
    let validator = QualityGateValidator::with_config(&QualityConfig::default(), alerts.clone());

    let operation = op("quality_validation", json!({"workspace_id": HARDCODED_ID}));
    let (can_proceed, report) = validator.validate(&operation, "ws-tenant-a");

    assert!(!can_proceed);
    assert!(!report.blocking_issues.is_empty());
    assert_eq!(alerts.len(), 1);

    let raised = validator.alerts(Some("ws-tenant-a"), 10);
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].blocking_issues, report.blocking_issues);
    assert!(validator.alerts(Some("ws-tenant-b"), 10).is_empty());
}

#[test]
fn lorem_ipsum_fails_real_content_without_blocking() {
    let validator = QualityGateValidator::new();
    let operation = op(
        "task_completion",
        json!({
            "task_id": "t-1",
            "result": {"body": "Lorem Ipsum dolor sit amet"},
            "summary": "Drafted landing page copy"
        }),
    );

    let (can_proceed, report) = validator.validate(&operation, "ws-1");

    assert!(can_proceed);
    assert!(report.blocking_issues.is_empty());
    assert!(report.compliance_score < 100);
    assert!(report
        .checks_failed
        .iter()
        .any(|entry| entry.check == "real_content"));
}

#[test]
fn foreign_workspace_in_nested_payload_blocks() {
    let validator = QualityGateValidator::new();
    let operation = op(
        "goal_decomposition",
        json!({
            "goal_id": "g-1",
            "tasks": [{"name": "Outreach", "workspace_id": "ws-other"}],
            "ai_model": "llama3.2",
            "reasoning": "Split by channel"
        }),
    );

    let (can_proceed, report) = validator.validate(&operation, "ws-1");

    assert!(!can_proceed);
    assert!(report
        .blocking_issues
        .iter()
        .any(|issue| issue.starts_with("no_hardcoding")));
}

#[test]
fn recovery_without_ai_marker_blocks() {
    let validator = QualityGateValidator::new();
    let operation = op(
        "recovery_strategy",
        json!({"task_id": "t-9", "strategy": "DELAYED_RETRY"}),
    );

    let (can_proceed, report) = validator.validate(&operation, "ws-1");

    assert!(!can_proceed);
    assert!(report
        .blocking_issues
        .iter()
        .any(|issue| issue.starts_with("ai_driven")));
}

#[test]
fn undefined_workspace_blocks() {
    let validator = QualityGateValidator::new();
    let operation = op("goal_update", json!({"goal_id": "g-1", "summary": "Halfway there"}));

    let (can_proceed, report) = validator.validate(&operation, "undefined");

    assert!(!can_proceed);
    assert!(report
        .blocking_issues
        .iter()
        .any(|issue| issue.starts_with("multi_tenant")));
}

#[test]
fn missing_required_field_is_invalid_input() {
    let err = Operation::from_parts("agent_assignment", json!({"reasoning": "no agent"})).unwrap_err();
    assert!(matches!(err, taskguard::PolicyError::InvalidInput(_)));

    let err = Operation::from_parts("teleport", json!({})).unwrap_err();
    assert!(matches!(err, taskguard::PolicyError::InvalidInput(_)));
}

#[test]
fn repeated_validation_is_stable() {
    let validator = QualityGateValidator::new();
    let operation = op(
        "recovery",
        json!({"task_id": "t-1", "requires_human_intervention": true, "reasoning": "Escalating"}),
    );

    let (_, first) = validator.validate(&operation, "ws-1");
    let (_, second) = validator.validate(&operation, "ws-1");

    assert_eq!(first.compliance_score, second.compliance_score);
    assert_eq!(first.blocking_issues, second.blocking_issues);
}
