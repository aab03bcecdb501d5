//! The eight quality gate checks
//!
//! Every check is independent. Checks that do not apply to an operation type
//! pass as "not applicable". `no_hardcoding`, `ai_driven` and `multi_tenant`
//! are critical; the rest are advisory.

use crate::errors::Result;
use crate::quality::operations::{Operation, OperationKind};
use crate::quality::types::{CheckOutcome, Severity};
use serde_json::Value;

/// Workspace id that leaked into production payloads from test fixtures
pub const KNOWN_TEST_WORKSPACE_ID: &str = "f79d87cc-b61f-491d-9226-4220e39e71ad";

/// Placeholders matched case-insensitively anywhere in the payload
const PLACEHOLDER_PHRASES: &[&str] = &[
    "lorem ipsum",
    "example.com",
    "placeholder",
    "[insert",
    "your name here",
];

/// Placeholders matched case-sensitively as whole words
const PLACEHOLDER_MARKERS: &[&str] = &["TODO", "TBD", "FIXME"];

/// Input handed to every check
pub struct CheckContext<'a> {
    pub operation: &'a Operation,
    pub workspace_id: &'a str,
}

/// One independent quality rule
pub trait QualityCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn severity(&self) -> Severity;

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome>;
}

/// The standard check list, in reporting order
pub fn default_checks(hardcoded_ids: Vec<String>) -> Vec<Box<dyn QualityCheck>> {
    vec![
        Box::new(NoHardcodingCheck::new(hardcoded_ids)),
        Box::new(AiDrivenCheck),
        Box::new(MultiTenantCheck),
        Box::new(LearningCaptureCheck),
        Box::new(ExplainabilityCheck),
        Box::new(AutonomousCapabilityCheck),
        Box::new(RealContentCheck),
        Box::new(UserVisibilityCheck),
    ]
}

/// Payload must not embed hardcoded workspace ids or foreign workspace ids
pub struct NoHardcodingCheck {
    hardcoded_ids: Vec<String>,
}

impl NoHardcodingCheck {
    pub fn new(hardcoded_ids: Vec<String>) -> Self {
        Self { hardcoded_ids }
    }
}

impl QualityCheck for NoHardcodingCheck {
    fn name(&self) -> &'static str {
        "no_hardcoding"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        let payload = ctx.operation.payload()?;
        let text = payload.to_string();

        if let Some(id) = self
            .hardcoded_ids
            .iter()
            .find(|id| !id.is_empty() && text.contains(id.as_str()))
        {
            return Ok(CheckOutcome::fail(format!(
                "payload contains hardcoded workspace id {}",
                id
            )));
        }

        let mut foreign = Vec::new();
        collect_workspace_ids(&payload, &mut foreign);
        if let Some(other) = foreign.into_iter().find(|id| *id != ctx.workspace_id) {
            return Ok(CheckOutcome::fail(format!(
                "payload workspace_id {} does not match caller workspace {}",
                other, ctx.workspace_id
            )));
        }

        Ok(CheckOutcome::pass("no hardcoded identifiers"))
    }
}

/// Every string `workspace_id` value at any depth
fn collect_workspace_ids<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "workspace_id" {
                    if let Value::String(id) = child {
                        out.push(id);
                    }
                }
                collect_workspace_ids(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_workspace_ids(item, out);
            }
        }
        _ => {}
    }
}

/// AI-owned decisions must show AI involvement
pub struct AiDrivenCheck;

impl QualityCheck for AiDrivenCheck {
    fn name(&self) -> &'static str {
        "ai_driven"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        if !matches!(
            ctx.operation.kind(),
            OperationKind::AgentAssignment
                | OperationKind::GoalDecomposition
                | OperationKind::RecoveryStrategy
        ) {
            return Ok(CheckOutcome::not_applicable());
        }

        if ctx.operation.fields().has_ai_marker() {
            Ok(CheckOutcome::pass("AI involvement recorded"))
        } else {
            Ok(CheckOutcome::fail(
                "no AI involvement marker (confidence_score, reasoning, ai_model, ai_analysis)",
            ))
        }
    }
}

/// Operation must be scoped to exactly one real workspace
pub struct MultiTenantCheck;

impl QualityCheck for MultiTenantCheck {
    fn name(&self) -> &'static str {
        "multi_tenant"
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        let workspace_id = ctx.workspace_id.trim();
        if workspace_id.is_empty() {
            return Ok(CheckOutcome::fail("workspace_id is empty"));
        }
        if workspace_id == "undefined" {
            return Ok(CheckOutcome::fail("workspace_id is \"undefined\""));
        }
        if ctx.operation.fields().is_cross_workspace() {
            return Ok(CheckOutcome::fail("cross_workspace operations are not allowed"));
        }
        Ok(CheckOutcome::pass("workspace isolated"))
    }
}

/// Learning capture must not be switched off
pub struct LearningCaptureCheck;

impl QualityCheck for LearningCaptureCheck {
    fn name(&self) -> &'static str {
        "learning_capture"
    }

    fn severity(&self) -> Severity {
        Severity::Advisory
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        if !matches!(
            ctx.operation.kind(),
            OperationKind::Recovery | OperationKind::Assignment | OperationKind::QualityValidation
        ) {
            return Ok(CheckOutcome::not_applicable());
        }

        if ctx.operation.fields().learning_disabled() {
            Ok(CheckOutcome::fail("learning capture is disabled"))
        } else {
            Ok(CheckOutcome::pass("learning captured"))
        }
    }
}

pub struct ExplainabilityCheck;

impl QualityCheck for ExplainabilityCheck {
    fn name(&self) -> &'static str {
        "explainability"
    }

    fn severity(&self) -> Severity {
        Severity::Advisory
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        if !matches!(
            ctx.operation.kind(),
            OperationKind::Recovery | OperationKind::AgentAssignment
        ) {
            return Ok(CheckOutcome::not_applicable());
        }

        if ctx.operation.fields().has_rationale() {
            Ok(CheckOutcome::pass("decision is explained"))
        } else {
            Ok(CheckOutcome::fail("missing reasoning or explanation"))
        }
    }
}

pub struct AutonomousCapabilityCheck;

impl QualityCheck for AutonomousCapabilityCheck {
    fn name(&self) -> &'static str {
        "autonomous_capability"
    }

    fn severity(&self) -> Severity {
        Severity::Advisory
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        if !matches!(
            ctx.operation.kind(),
            OperationKind::Recovery | OperationKind::AutoAssignment
        ) {
            return Ok(CheckOutcome::not_applicable());
        }

        if ctx.operation.fields().needs_human() {
            Ok(CheckOutcome::fail("operation requires human intervention"))
        } else {
            Ok(CheckOutcome::pass("runs autonomously"))
        }
    }
}

/// Payload must not contain placeholder content
pub struct RealContentCheck;

impl QualityCheck for RealContentCheck {
    fn name(&self) -> &'static str {
        "real_content"
    }

    fn severity(&self) -> Severity {
        Severity::Advisory
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        let text = ctx.operation.payload()?.to_string();
        match find_placeholder(&text) {
            Some(token) => Ok(CheckOutcome::fail(format!(
                "placeholder content found: {}",
                token
            ))),
            None => Ok(CheckOutcome::pass("no placeholder content")),
        }
    }
}

/// First placeholder found in the text, if any
pub fn find_placeholder(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if let Some(phrase) = PLACEHOLDER_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Some(*phrase);
    }

    text.split(|c: char| !c.is_alphanumeric())
        .find_map(|word| PLACEHOLDER_MARKERS.iter().find(|m| **m == word).copied())
}

/// User-facing operations must say something to the user
pub struct UserVisibilityCheck;

impl QualityCheck for UserVisibilityCheck {
    fn name(&self) -> &'static str {
        "user_visibility"
    }

    fn severity(&self) -> Severity {
        Severity::Advisory
    }

    fn evaluate(&self, ctx: &CheckContext<'_>) -> Result<CheckOutcome> {
        if !matches!(
            ctx.operation.kind(),
            OperationKind::TaskCompletion | OperationKind::GoalUpdate | OperationKind::Recovery
        ) {
            return Ok(CheckOutcome::not_applicable());
        }

        if ctx.operation.fields().has_user_facing_output() {
            Ok(CheckOutcome::pass("user-facing output present"))
        } else {
            Ok(CheckOutcome::fail(
                "no user-facing field (user_message, summary, display_content, visible_to_user)",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(kind: &str, data: Value) -> Operation {
        Operation::from_parts(kind, data).unwrap()
    }

    fn run(check: &dyn QualityCheck, operation: &Operation, workspace_id: &str) -> CheckOutcome {
        check
            .evaluate(&CheckContext {
                operation,
                workspace_id,
            })
            .unwrap()
    }

    fn no_hardcoding() -> NoHardcodingCheck {
        NoHardcodingCheck::new(vec![KNOWN_TEST_WORKSPACE_ID.to_string()])
    }

    #[test]
    fn test_hardcoded_id_fails() {
        let operation = op(
            "quality_validation",
            json!({"workspace_id": KNOWN_TEST_WORKSPACE_ID}),
        );
        let outcome = run(&no_hardcoding(), &operation, "ws-1");
        assert!(!outcome.passed);
        assert!(outcome.message.contains(KNOWN_TEST_WORKSPACE_ID));
    }

    #[test]
    fn test_hardcoded_id_fails_even_for_same_caller() {
        let operation = op(
            "quality_validation",
            json!({"workspace_id": KNOWN_TEST_WORKSPACE_ID}),
        );
        assert!(!run(&no_hardcoding(), &operation, KNOWN_TEST_WORKSPACE_ID).passed);
    }

    #[test]
    fn test_nested_foreign_workspace_fails() {
        let operation = op(
            "task_completion",
            json!({"task_id": "t-1", "result": {"rows": [{"workspace_id": "ws-2"}]}}),
        );
        let outcome = run(&no_hardcoding(), &operation, "ws-1");
        assert!(!outcome.passed);
        assert!(outcome.message.contains("ws-2"));

        let same = op(
            "task_completion",
            json!({"task_id": "t-1", "workspace_id": "ws-1", "result": {"workspace_id": "ws-1"}}),
        );
        assert!(run(&no_hardcoding(), &same, "ws-1").passed);
    }

    #[test]
    fn test_ai_driven() {
        let bare = op("agent_assignment", json!({"agent_id": "a-1"}));
        assert!(!run(&AiDrivenCheck, &bare, "ws-1").passed);

        let scored = op("agent_assignment", json!({"agent_id": "a-1", "confidence_score": 0.8}));
        assert!(run(&AiDrivenCheck, &scored, "ws-1").passed);

        let other = op("task_completion", json!({"task_id": "t-1"}));
        assert_eq!(run(&AiDrivenCheck, &other, "ws-1"), CheckOutcome::not_applicable());
    }

    #[test]
    fn test_structured_reasoning_counts_as_marker() {
        let structured = op(
            "agent_assignment",
            json!({"agent_id": "a", "reasoning": {"factors": ["skill"]}}),
        );
        assert!(run(&AiDrivenCheck, &structured, "ws-1").passed);
        assert!(run(&ExplainabilityCheck, &structured, "ws-1").passed);

        let quoted_score = op("recovery", json!({"task_id": "t", "confidence_score": "0.8"}));
        assert!(run(&AiDrivenCheck, &quoted_score, "ws-1").passed);

        let blank = op("agent_assignment", json!({"agent_id": "a", "reasoning": "   "}));
        assert!(!run(&AiDrivenCheck, &blank, "ws-1").passed);
        assert!(!run(&ExplainabilityCheck, &blank, "ws-1").passed);
    }

    #[test]
    fn test_multi_tenant() {
        let operation = op("task_completion", json!({"task_id": "t-1"}));
        assert!(!run(&MultiTenantCheck, &operation, "").passed);
        assert!(!run(&MultiTenantCheck, &operation, "undefined").passed);
        assert!(run(&MultiTenantCheck, &operation, "ws-1").passed);

        let cross = op("task_completion", json!({"task_id": "t-1", "cross_workspace": true}));
        assert!(!run(&MultiTenantCheck, &cross, "ws-1").passed);
    }

    #[test]
    fn test_advisory_checks() {
        let recovery = op(
            "recovery",
            json!({"task_id": "t-1", "capture_learning": false, "requires_human_intervention": true}),
        );
        assert!(!run(&LearningCaptureCheck, &recovery, "ws-1").passed);
        assert!(!run(&ExplainabilityCheck, &recovery, "ws-1").passed);
        assert!(!run(&AutonomousCapabilityCheck, &recovery, "ws-1").passed);
        assert!(!run(&UserVisibilityCheck, &recovery, "ws-1").passed);

        let good = op(
            "recovery",
            json!({"task_id": "t-1", "explanation": "transient outage", "summary": "Retrying shortly"}),
        );
        assert!(run(&LearningCaptureCheck, &good, "ws-1").passed);
        assert!(run(&ExplainabilityCheck, &good, "ws-1").passed);
        assert!(run(&AutonomousCapabilityCheck, &good, "ws-1").passed);
        assert!(run(&UserVisibilityCheck, &good, "ws-1").passed);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(find_placeholder("Hello LOREM Ipsum dolor"), Some("lorem ipsum"));
        assert_eq!(find_placeholder("mail me at bob@Example.com"), Some("example.com"));
        assert_eq!(find_placeholder("TODO: fill in"), Some("TODO"));
        // lowercase "todo" is an ordinary word
        assert_eq!(find_placeholder("my todo list app"), None);
        assert_eq!(find_placeholder("TODOS are done"), None);
        assert_eq!(find_placeholder("Quarterly revenue grew 12%"), None);
    }

    #[test]
    fn test_real_content_check() {
        let operation = op(
            "task_completion",
            json!({"task_id": "t-1", "result": {"body": "Lorem ipsum dolor sit amet"}}),
        );
        let outcome = run(&RealContentCheck, &operation, "ws-1");
        assert!(!outcome.passed);
        assert!(outcome.message.contains("lorem ipsum"));
    }

    #[test]
    fn test_default_check_order() {
        let names: Vec<_> = default_checks(vec![]).iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "no_hardcoding",
                "ai_driven",
                "multi_tenant",
                "learning_capture",
                "explainability",
                "autonomous_capability",
                "real_content",
                "user_visibility",
            ]
        );
    }
}
