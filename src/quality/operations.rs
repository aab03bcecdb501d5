//! Typed operations submitted to the quality gates
//!
//! Each operation type is its own variant with its required fields; the
//! optional markers the checks inspect live in [`OperationFields`]. Wire
//! format is `{"operation_type": "...", "operation_data": {...}}`.

use crate::errors::{PolicyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Operation type without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    AgentAssignment,
    AutoAssignment,
    Assignment,
    GoalDecomposition,
    RecoveryStrategy,
    Recovery,
    QualityValidation,
    TaskCompletion,
    GoalUpdate,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::AgentAssignment => "agent_assignment",
            OperationKind::AutoAssignment => "auto_assignment",
            OperationKind::Assignment => "assignment",
            OperationKind::GoalDecomposition => "goal_decomposition",
            OperationKind::RecoveryStrategy => "recovery_strategy",
            OperationKind::Recovery => "recovery",
            OperationKind::QualityValidation => "quality_validation",
            OperationKind::TaskCompletion => "task_completion",
            OperationKind::GoalUpdate => "goal_update",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markers shared by every operation type. Values are kept as raw JSON:
/// the checks ask whether a marker is present, not what shape it has.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_workspace: Option<Value>,

    // AI involvement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_learning: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_human_intervention: Option<Value>,

    // User-facing output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to_user: Option<Value>,

    /// Any other payload keys, kept for the content checks
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationFields {
    /// Whether the payload carries any sign of AI involvement
    pub fn has_ai_marker(&self) -> bool {
        [
            &self.confidence_score,
            &self.reasoning,
            &self.ai_model,
            &self.ai_analysis,
        ]
        .into_iter()
        .any(is_present)
    }

    /// Whether a non-blank reasoning or explanation is present
    pub fn has_rationale(&self) -> bool {
        is_present(&self.reasoning) || is_present(&self.explanation)
    }

    pub fn has_user_facing_output(&self) -> bool {
        is_present(&self.user_message)
            || is_present(&self.summary)
            || is_present(&self.display_content)
            || flag(&self.visible_to_user) == Some(true)
    }

    pub fn is_cross_workspace(&self) -> bool {
        flag(&self.cross_workspace) == Some(true)
    }

    pub fn learning_disabled(&self) -> bool {
        flag(&self.capture_learning) == Some(false)
    }

    pub fn needs_human(&self) -> bool {
        flag(&self.requires_human_intervention) == Some(true)
    }
}

/// Non-null, and not a blank string or an empty collection
fn is_present(field: &Option<Value>) -> bool {
    match field {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// A boolean marker, accepting `true`/`false` strings as well
fn flag(field: &Option<Value>) -> Option<bool> {
    match field {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentOp {
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Value>,
    #[serde(flatten)]
    pub fields: OperationFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDecompositionOp {
    pub goal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Value>,
    #[serde(flatten)]
    pub fields: OperationFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOp {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Value>,
    #[serde(flatten)]
    pub fields: OperationFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityValidationOp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Value>,
    #[serde(flatten)]
    pub fields: OperationFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompletionOp {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(flatten)]
    pub fields: OperationFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalUpdateOp {
    pub goal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Value>,
    #[serde(flatten)]
    pub fields: OperationFields,
}

/// An operation submitted for validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "operation_type",
    content = "operation_data",
    rename_all = "snake_case"
)]
pub enum Operation {
    AgentAssignment(AssignmentOp),
    AutoAssignment(AssignmentOp),
    Assignment(AssignmentOp),
    GoalDecomposition(GoalDecompositionOp),
    RecoveryStrategy(RecoveryOp),
    Recovery(RecoveryOp),
    QualityValidation(QualityValidationOp),
    TaskCompletion(TaskCompletionOp),
    GoalUpdate(GoalUpdateOp),
}

impl Operation {
    /// Build an operation from its type name and raw payload
    pub fn from_parts(operation_type: &str, operation_data: Value) -> Result<Operation> {
        let tagged = serde_json::json!({
            "operation_type": operation_type,
            "operation_data": operation_data,
        });
        serde_json::from_value(tagged).map_err(|e| {
            PolicyError::InvalidInput(format!("invalid {} operation: {}", operation_type, e))
        })
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::AgentAssignment(_) => OperationKind::AgentAssignment,
            Operation::AutoAssignment(_) => OperationKind::AutoAssignment,
            Operation::Assignment(_) => OperationKind::Assignment,
            Operation::GoalDecomposition(_) => OperationKind::GoalDecomposition,
            Operation::RecoveryStrategy(_) => OperationKind::RecoveryStrategy,
            Operation::Recovery(_) => OperationKind::Recovery,
            Operation::QualityValidation(_) => OperationKind::QualityValidation,
            Operation::TaskCompletion(_) => OperationKind::TaskCompletion,
            Operation::GoalUpdate(_) => OperationKind::GoalUpdate,
        }
    }

    pub fn fields(&self) -> &OperationFields {
        match self {
            Operation::AgentAssignment(op)
            | Operation::AutoAssignment(op)
            | Operation::Assignment(op) => &op.fields,
            Operation::GoalDecomposition(op) => &op.fields,
            Operation::RecoveryStrategy(op) | Operation::Recovery(op) => &op.fields,
            Operation::QualityValidation(op) => &op.fields,
            Operation::TaskCompletion(op) => &op.fields,
            Operation::GoalUpdate(op) => &op.fields,
        }
    }

    /// The operation data as JSON, as it would appear on the wire
    pub fn payload(&self) -> Result<Value> {
        let value = match self {
            Operation::AgentAssignment(op)
            | Operation::AutoAssignment(op)
            | Operation::Assignment(op) => serde_json::to_value(op)?,
            Operation::GoalDecomposition(op) => serde_json::to_value(op)?,
            Operation::RecoveryStrategy(op) | Operation::Recovery(op) => serde_json::to_value(op)?,
            Operation::QualityValidation(op) => serde_json::to_value(op)?,
            Operation::TaskCompletion(op) => serde_json::to_value(op)?,
            Operation::GoalUpdate(op) => serde_json::to_value(op)?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts_typed() {
        let op = Operation::from_parts(
            "agent_assignment",
            json!({"agent_id": "a-1", "reasoning": "best skill match", "priority": "high"}),
        )
        .unwrap();
        assert_eq!(op.kind(), OperationKind::AgentAssignment);
        assert!(op.fields().has_ai_marker());
        assert_eq!(op.fields().extra.get("priority"), Some(&json!("high")));
    }

    #[test]
    fn test_unknown_operation_type_rejected() {
        let err = Operation::from_parts("teleport", json!({})).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let err = Operation::from_parts("goal_update", json!({"progress": 0.5})).unwrap_err();
        assert!(err.to_string().contains("goal_id"));
    }

    #[test]
    fn test_payload_keeps_every_key() {
        let data = json!({
            "task_id": "t-1",
            "summary": "Recovered after retry",
            "context": {"workspace_id": "ws-9"}
        });
        let op = Operation::from_parts("recovery", data.clone()).unwrap();
        assert_eq!(op.payload().unwrap(), data);
    }

    #[test]
    fn test_wire_format() {
        let op = Operation::from_parts("task_completion", json!({"task_id": "t-1"})).unwrap();
        let wire = serde_json::to_value(&op).unwrap();
        assert_eq!(wire["operation_type"], "task_completion");
        assert_eq!(wire["operation_data"]["task_id"], "t-1");
    }

    #[test]
    fn test_rationale_skips_blank() {
        let fields = OperationFields {
            reasoning: Some(json!("  ")),
            explanation: Some(json!("matched skills")),
            ..Default::default()
        };
        assert!(fields.has_rationale());
        assert!(!fields.has_ai_marker());
    }

    #[test]
    fn test_structured_markers_accepted() {
        let op = Operation::from_parts(
            "agent_assignment",
            json!({"agent_id": "a", "reasoning": {"factors": ["skill"]}}),
        )
        .unwrap();
        assert!(op.fields().has_ai_marker());
        assert!(op.fields().has_rationale());

        let op = Operation::from_parts(
            "recovery",
            json!({"task_id": "t", "confidence_score": "0.8", "strategy": {"kind": "retry"}}),
        )
        .unwrap();
        assert!(op.fields().has_ai_marker());
    }

    #[test]
    fn test_empty_markers_are_absent() {
        let op = Operation::from_parts(
            "agent_assignment",
            json!({"agent_id": "a", "reasoning": {}, "ai_model": "", "confidence_score": null}),
        )
        .unwrap();
        assert!(!op.fields().has_ai_marker());
    }

    #[test]
    fn test_string_flags() {
        let op = Operation::from_parts(
            "recovery",
            json!({"task_id": "t", "cross_workspace": "true", "capture_learning": "False"}),
        )
        .unwrap();
        assert!(op.fields().is_cross_workspace());
        assert!(op.fields().learning_disabled());
        assert!(!op.fields().needs_human());
    }
}
