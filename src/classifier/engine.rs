//! Task execution classifier
//!
//! Decides how a task must be executed before an agent runs it. The AI path
//! sees the real tool inventory; when it is disabled, fails or times out the
//! keyword fallback answers instead. The tool-availability downgrade runs on
//! both paths, so a DATA_COLLECTION result always has a real search tool.

use crate::ai::{self, CompletionProvider};
use crate::classifier::heuristics::{classify_by_keywords, enforce_tool_availability};
use crate::classifier::types::{
    AiClassificationReply, OutputSpecificity, TaskExecutionClassification, TaskExecutionType,
    WorkspaceContext,
};
use crate::errors::{PolicyError, Result};
use crate::telemetry::{AiOutcome, Component, TelemetryCollector, TelemetryEvent};
use crate::tools::ToolInventory;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default AI deadline
const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(15);

/// Confidence assumed when the model omits one
const DEFAULT_AI_CONFIDENCE: f64 = 0.7;

pub struct TaskExecutionClassifier {
    ai: Option<Arc<dyn CompletionProvider>>,
    ai_enabled: bool,
    ai_timeout: Duration,
    telemetry: TelemetryCollector,
}

impl TaskExecutionClassifier {
    /// Keyword-only classifier
    pub fn new() -> Self {
        Self {
            ai: None,
            ai_enabled: true,
            ai_timeout: DEFAULT_AI_TIMEOUT,
            telemetry: TelemetryCollector::new(),
        }
    }

    pub fn with_ai(mut self, provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        self.ai = Some(provider);
        self.ai_timeout = timeout;
        self
    }

    /// Switch the AI path off without dropping the provider
    pub fn with_ai_enabled(mut self, enabled: bool) -> Self {
        self.ai_enabled = enabled;
        self
    }

    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Classify one task. Never fails; AI problems fall back to keywords.
    pub async fn classify(
        &self,
        task_name: &str,
        task_description: &str,
        tools: &ToolInventory,
        workspace: &WorkspaceContext,
    ) -> TaskExecutionClassification {
        let classification = match self.classify_with_ai(task_name, task_description, tools, workspace).await {
            Some(classification) => classification,
            None => classify_by_keywords(task_name, task_description, tools),
        };

        tracing::info!(
            workspace_id = %workspace.workspace_id,
            task = task_name,
            execution_type = %classification.execution_type,
            output_specificity = ?classification.output_specificity,
            requires_tools = classification.requires_tools,
            fallback_used = classification.fallback_used,
            "Task classified"
        );
        self.telemetry.record(TelemetryEvent::ClassificationCompleted {
            execution_type: classification.execution_type.to_string(),
            fallback_used: classification.fallback_used,
        });

        classification
    }

    async fn classify_with_ai(
        &self,
        task_name: &str,
        task_description: &str,
        tools: &ToolInventory,
        workspace: &WorkspaceContext,
    ) -> Option<TaskExecutionClassification> {
        if !self.ai_enabled {
            return None;
        }
        let provider = self.ai.as_ref()?;

        let prompt = build_classification_prompt(task_name, task_description, tools, workspace);
        let start = Instant::now();
        let reply: Result<AiClassificationReply> =
            ai::complete_json_with_timeout(provider.as_ref(), &prompt, self.ai_timeout).await;

        let outcome = match &reply {
            Ok(_) => AiOutcome::Success,
            Err(PolicyError::AiTimeout { .. }) => AiOutcome::Timeout,
            Err(_) => AiOutcome::Failure,
        };
        self.telemetry
            .record_ai_call(Component::Classifier, outcome, start.elapsed());

        match reply {
            Ok(reply) => Some(enforce_tool_availability(from_ai_reply(reply), tools)),
            Err(e) => {
                tracing::warn!(
                    task = task_name,
                    provider = provider.name(),
                    error = %e,
                    "AI classification unavailable; using keyword fallback"
                );
                None
            }
        }
    }
}

impl Default for TaskExecutionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn from_ai_reply(reply: AiClassificationReply) -> TaskExecutionClassification {
    let execution_type = TaskExecutionType::from_ai_label(&reply.execution_type);
    let output_specificity = reply
        .output_specificity
        .as_deref()
        .map(OutputSpecificity::from_ai_label)
        .unwrap_or(OutputSpecificity::Methodology);
    let confidence_score = reply
        .confidence_score
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_AI_CONFIDENCE);

    TaskExecutionClassification {
        execution_type,
        requires_tools: reply.requires_tools.unwrap_or(false),
        tools_needed: reply
            .tools_needed
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        output_specificity,
        expected_data_format: reply
            .expected_data_format
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty()),
        confidence_score,
        reasoning: reply.reasoning.unwrap_or_default(),
        fallback_used: false,
    }
}

fn build_classification_prompt(
    task_name: &str,
    task_description: &str,
    tools: &ToolInventory,
    workspace: &WorkspaceContext,
) -> String {
    format!(
        r#"Classify how the following task must be executed.

WORKSPACE GOAL: {goal}
DOMAIN: {domain}
TASK: {name}
DESCRIPTION: {description}

AVAILABLE TOOLS (type "fallback" means the tool cannot fetch real external data):
{tools}

Execution types:
- PLANNING: produce a plan or strategy
- DATA_COLLECTION: gather real external data (requires a real web_search tool)
- CONTENT_GENERATION: write content, templates or methodology
- ANALYSIS: analyze or compare provided information
- VALIDATION: verify or review existing work

If the task asks for external data but no real web_search tool is listed, answer
CONTENT_GENERATION with output_specificity "methodology".

Respond with JSON only:
{{"execution_type": "<type>", "requires_tools": <bool>, "tools_needed": ["<tool name>"], "output_specificity": "methodology|specific_data|mixed", "expected_data_format": "<format or null>", "confidence_score": <0.0-1.0>, "reasoning": "<one sentence>"}}"#,
        goal = workspace.goal.as_deref().unwrap_or("(unspecified)"),
        domain = workspace.domain.as_deref().unwrap_or("(unspecified)"),
        name = task_name,
        description = task_description,
        tools = tools.describe(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::{FailingProvider, FixedProvider, SlowProvider};
    use crate::tools::ToolDescriptor;

    fn fallback_only() -> ToolInventory {
        ToolInventory::new(vec![ToolDescriptor::fallback("web_search", &["web_search"])])
    }

    fn real_search() -> ToolInventory {
        ToolInventory::new(vec![ToolDescriptor::mcp("brave_search", &["web_search"])])
    }

    fn workspace() -> WorkspaceContext {
        WorkspaceContext::new("ws-1").with_goal("Grow the newsletter")
    }

    const DATA_REPLY: &str = r#"{"execution_type": "DATA_COLLECTION", "requires_tools": true,
        "tools_needed": ["brave_search", "imaginary_scraper"], "output_specificity": "specific_data",
        "expected_data_format": "CSV", "confidence_score": 0.92, "reasoning": "Needs real contacts"}"#;

    #[tokio::test]
    async fn test_ai_data_collection_with_real_tool() {
        let provider = Arc::new(FixedProvider::new(DATA_REPLY));
        let classifier = TaskExecutionClassifier::new().with_ai(provider.clone(), Duration::from_secs(1));

        let c = classifier
            .classify("Leads", "collect 50 contacts", &real_search(), &workspace())
            .await;
        assert_eq!(c.execution_type, TaskExecutionType::DataCollection);
        assert_eq!(c.output_specificity, OutputSpecificity::SpecificData);
        assert!(!c.fallback_used);
        assert!(c.requires_tools);
        // invented tools are dropped
        assert_eq!(c.tools_needed.iter().collect::<Vec<_>>(), vec!["brave_search"]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ai_data_collection_downgraded_with_fallback_tools() {
        let provider = Arc::new(FixedProvider::new(DATA_REPLY));
        let classifier = TaskExecutionClassifier::new().with_ai(provider, Duration::from_secs(1));

        let c = classifier
            .classify("Leads", "collect 50 contacts", &fallback_only(), &workspace())
            .await;
        assert_eq!(c.execution_type, TaskExecutionType::ContentGeneration);
        assert_eq!(c.output_specificity, OutputSpecificity::Methodology);
        assert!(!c.requires_tools);
        assert!(c.tools_needed.is_empty());
        assert!(!c.fallback_used);
    }

    #[tokio::test]
    async fn test_failing_ai_falls_back() {
        let classifier =
            TaskExecutionClassifier::new().with_ai(Arc::new(FailingProvider), Duration::from_secs(1));
        let c = classifier
            .classify("Leads", "collect 50 contacts", &fallback_only(), &workspace())
            .await;
        assert!(c.fallback_used);
        assert_eq!(c.execution_type, TaskExecutionType::ContentGeneration);
    }

    #[tokio::test]
    async fn test_slow_ai_times_out_and_falls_back() {
        let telemetry = TelemetryCollector::new();
        let classifier = TaskExecutionClassifier::new()
            .with_ai(Arc::new(SlowProvider), Duration::from_millis(20))
            .with_telemetry(telemetry.clone());

        let c = classifier
            .classify("Plan", "Outline the launch", &real_search(), &workspace())
            .await;
        assert!(c.fallback_used);
        assert_eq!(c.execution_type, TaskExecutionType::Planning);

        let stats = telemetry.get_stats();
        assert_eq!(stats.ai_timeouts, 1);
        assert_eq!(stats.fallback_classifications, 1);
    }

    #[tokio::test]
    async fn test_unknown_ai_label_fails_closed() {
        let provider = Arc::new(FixedProvider::new(
            r#"{"execution_type": "SCRAPING", "output_specificity": "everything"}"#,
        ));
        let classifier = TaskExecutionClassifier::new().with_ai(provider, Duration::from_secs(1));
        let c = classifier
            .classify("Leads", "collect data", &real_search(), &workspace())
            .await;
        assert_eq!(c.execution_type, TaskExecutionType::Planning);
        assert_eq!(c.output_specificity, OutputSpecificity::Methodology);
        assert_eq!(c.confidence_score, DEFAULT_AI_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_ai_disabled_skips_provider() {
        let provider = Arc::new(FixedProvider::new(DATA_REPLY));
        let classifier = TaskExecutionClassifier::new()
            .with_ai(provider.clone(), Duration::from_secs(1))
            .with_ai_enabled(false);
        let c = classifier
            .classify("Newsletter", "Write the intro", &real_search(), &workspace())
            .await;
        assert!(c.fallback_used);
        assert_eq!(c.execution_type, TaskExecutionType::ContentGeneration);
        assert_eq!(provider.call_count(), 0);
    }

    #[test]
    fn test_prompt_lists_tools() {
        let prompt = build_classification_prompt("Leads", "collect", &fallback_only(), &workspace());
        assert!(prompt.contains("web_search"));
        assert!(prompt.contains("fallback"));
        assert!(prompt.contains("Grow the newsletter"));
    }
}
