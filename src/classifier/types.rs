//! Task execution classification types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Execution mode a task requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskExecutionType {
    Planning,
    DataCollection,
    ContentGeneration,
    Analysis,
    Validation,
}

impl TaskExecutionType {
    /// Strict parse of a model-supplied label. Accepts case and separator
    /// variations of the five known labels only.
    pub fn parse(label: &str) -> Option<TaskExecutionType> {
        match normalize_label(label).as_str() {
            "planning" => Some(TaskExecutionType::Planning),
            "data_collection" => Some(TaskExecutionType::DataCollection),
            "content_generation" => Some(TaskExecutionType::ContentGeneration),
            "analysis" => Some(TaskExecutionType::Analysis),
            "validation" => Some(TaskExecutionType::Validation),
            _ => None,
        }
    }

    /// Parse a model label, failing closed to PLANNING
    pub fn from_ai_label(label: &str) -> TaskExecutionType {
        Self::parse(label).unwrap_or_else(|| {
            tracing::warn!(label, "Unrecognized execution_type from AI; defaulting to PLANNING");
            TaskExecutionType::Planning
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskExecutionType::Planning => "PLANNING",
            TaskExecutionType::DataCollection => "DATA_COLLECTION",
            TaskExecutionType::ContentGeneration => "CONTENT_GENERATION",
            TaskExecutionType::Analysis => "ANALYSIS",
            TaskExecutionType::Validation => "VALIDATION",
        }
    }
}

impl fmt::Display for TaskExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of output the task is expected to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSpecificity {
    /// A method, template or plan for obtaining the result
    Methodology,

    /// The concrete data itself
    SpecificData,

    Mixed,
}

impl OutputSpecificity {
    pub fn parse(label: &str) -> Option<OutputSpecificity> {
        match normalize_label(label).as_str() {
            "methodology" => Some(OutputSpecificity::Methodology),
            "specific_data" => Some(OutputSpecificity::SpecificData),
            "mixed" => Some(OutputSpecificity::Mixed),
            _ => None,
        }
    }

    /// Parse a model label, failing closed to methodology
    pub fn from_ai_label(label: &str) -> OutputSpecificity {
        Self::parse(label).unwrap_or_else(|| {
            tracing::warn!(label, "Unrecognized output_specificity from AI; defaulting to methodology");
            OutputSpecificity::Methodology
        })
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

/// Workspace-level context passed along with a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceContext {
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
}

impl WorkspaceContext {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            ..Default::default()
        }
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = Some(goal.into());
        self
    }
}

/// Result of classifying one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionClassification {
    pub execution_type: TaskExecutionType,
    pub requires_tools: bool,
    pub tools_needed: BTreeSet<String>,
    pub output_specificity: OutputSpecificity,
    pub expected_data_format: Option<String>,
    pub confidence_score: f64,
    pub reasoning: String,
    pub fallback_used: bool,
}

/// Raw classification reply expected from the model
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AiClassificationReply {
    #[serde(default)]
    pub execution_type: String,
    #[serde(default)]
    pub requires_tools: Option<bool>,
    #[serde(default)]
    pub tools_needed: Vec<String>,
    #[serde(default)]
    pub output_specificity: Option<String>,
    #[serde(default)]
    pub expected_data_format: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}
