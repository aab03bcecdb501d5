//! Keyword fallback classification
//!
//! Used when the AI provider is unconfigured, fails or times out. Keyword
//! sets are checked in a fixed order and matched as lowercase word prefixes,
//! so "collecting" hits "collect" but "specialist" does not hit "list".

use crate::classifier::types::{OutputSpecificity, TaskExecutionClassification, TaskExecutionType};
use crate::tools::{ToolInventory, WEB_SEARCH_CAPABILITY};
use std::collections::BTreeSet;

const DATA_COLLECTION_KEYWORDS: &[&str] = &["research", "find", "collect", "list"];
const CONTENT_KEYWORDS: &[&str] = &["create", "write", "generate"];
const ANALYSIS_KEYWORDS: &[&str] = &["analyze", "analyse", "compare", "evaluate"];
const VALIDATION_KEYWORDS: &[&str] = &["validate", "verify", "review", "check"];

/// Explicit format tokens, first match reported as `expected_data_format`
const FORMAT_TOKENS: &[(&str, Option<&str>)] = &[
    ("csv", Some("CSV")),
    ("json", Some("JSON")),
    ("xlsx", Some("XLSX")),
    ("markdown", Some("Markdown")),
    ("formato", None),
];

/// Confidence of a keyword hit
const KEYWORD_CONFIDENCE: f64 = 0.6;

/// Confidence of the PLANNING default
const DEFAULT_CONFIDENCE: f64 = 0.4;

/// Lowercased words of a text, in order
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn mentions_any(tokens: &[String], keywords: &[&str]) -> bool {
    tokens
        .iter()
        .any(|t| keywords.iter().any(|k| t.starts_with(k)))
}

/// Whether the text names an explicit output format, and which one
pub fn detect_format(text: &str) -> (bool, Option<String>) {
    let tokens = tokenize(text);
    let mut found = false;
    let mut format = None;

    for (token, label) in FORMAT_TOKENS {
        if tokens.iter().any(|t| t == token) {
            found = true;
            if format.is_none() {
                format = label.map(str::to_string);
            }
        }
    }

    (found, format)
}

/// Classify a task from its name and description alone
pub fn classify_by_keywords(
    task_name: &str,
    task_description: &str,
    tools: &ToolInventory,
) -> TaskExecutionClassification {
    let text = format!("{} {}", task_name, task_description);
    let tokens = tokenize(&text);
    let (has_format, expected_data_format) = detect_format(&text);

    let (execution_type, confidence, mut reasoning) = if mentions_any(&tokens, DATA_COLLECTION_KEYWORDS) {
        (
            TaskExecutionType::DataCollection,
            KEYWORD_CONFIDENCE,
            "Task text asks to research, find, collect or list data.".to_string(),
        )
    } else if mentions_any(&tokens, CONTENT_KEYWORDS) {
        (
            TaskExecutionType::ContentGeneration,
            KEYWORD_CONFIDENCE,
            "Task text asks to create, write or generate content.".to_string(),
        )
    } else if mentions_any(&tokens, ANALYSIS_KEYWORDS) {
        (
            TaskExecutionType::Analysis,
            KEYWORD_CONFIDENCE,
            "Task text asks for analysis or comparison.".to_string(),
        )
    } else if mentions_any(&tokens, VALIDATION_KEYWORDS) {
        (
            TaskExecutionType::Validation,
            KEYWORD_CONFIDENCE,
            "Task text asks for validation or review.".to_string(),
        )
    } else {
        (
            TaskExecutionType::Planning,
            DEFAULT_CONFIDENCE,
            "No execution keywords found; treating as planning.".to_string(),
        )
    };
    reasoning.push_str(" Keyword fallback classification.");

    let tools_needed: BTreeSet<String> = if execution_type == TaskExecutionType::DataCollection {
        tools.real_tools_with(WEB_SEARCH_CAPABILITY).into_iter().collect()
    } else {
        BTreeSet::new()
    };

    let classification = TaskExecutionClassification {
        execution_type,
        requires_tools: !tools_needed.is_empty(),
        tools_needed,
        output_specificity: if has_format {
            OutputSpecificity::SpecificData
        } else {
            OutputSpecificity::Methodology
        },
        expected_data_format,
        confidence_score: confidence,
        reasoning,
        fallback_used: true,
    };

    enforce_tool_availability(classification, tools)
}

/// Downgrade DATA_COLLECTION to CONTENT_GENERATION with methodology framing
/// when no real web-search tool is available. Applies to every path.
pub fn enforce_tool_availability(
    mut classification: TaskExecutionClassification,
    tools: &ToolInventory,
) -> TaskExecutionClassification {
    // Tools the model invented do not exist for this task.
    classification.tools_needed.retain(|name| tools.contains(name));

    if classification.execution_type == TaskExecutionType::DataCollection && !tools.can_collect_data() {
        classification.execution_type = TaskExecutionType::ContentGeneration;
        classification.output_specificity = OutputSpecificity::Methodology;
        classification.tools_needed.clear();
        classification.requires_tools = false;
        classification.reasoning.push_str(
            " Downgraded from DATA_COLLECTION: no real web_search tool is available, \
             so the deliverable is a methodology/template rather than collected data.",
        );
        tracing::debug!("Data collection downgraded to content generation (fallback tools only)");
    } else {
        classification.requires_tools = !classification.tools_needed.is_empty();
    }

    classification
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDescriptor;

    fn fallback_only() -> ToolInventory {
        ToolInventory::new(vec![ToolDescriptor::fallback("web_search", &["web_search"])])
    }

    fn real_search() -> ToolInventory {
        ToolInventory::new(vec![ToolDescriptor::mcp("brave_search", &["web_search"])])
    }

    #[test]
    fn test_collect_contacts_downgraded_without_real_tools() {
        let c = classify_by_keywords("Lead list", "collect 50 contacts", &fallback_only());
        assert_eq!(c.execution_type, TaskExecutionType::ContentGeneration);
        assert_eq!(c.output_specificity, OutputSpecificity::Methodology);
        assert!(!c.requires_tools);
        assert!(c.fallback_used);
    }

    #[test]
    fn test_collect_contacts_with_real_search() {
        let c = classify_by_keywords("Leads", "collect 50 contacts", &real_search());
        assert_eq!(c.execution_type, TaskExecutionType::DataCollection);
        assert!(c.requires_tools);
        assert!(c.tools_needed.contains("brave_search"));
    }

    #[test]
    fn test_downgrade_overrides_format_token() {
        let c = classify_by_keywords("Leads", "Find 20 investors, deliver as CSV", &fallback_only());
        assert_eq!(c.execution_type, TaskExecutionType::ContentGeneration);
        assert_eq!(c.output_specificity, OutputSpecificity::Methodology);
        assert_eq!(c.expected_data_format.as_deref(), Some("CSV"));
    }

    #[test]
    fn test_content_keywords() {
        let c = classify_by_keywords("Newsletter", "Write the welcome email", &real_search());
        assert_eq!(c.execution_type, TaskExecutionType::ContentGeneration);
        assert!(!c.requires_tools);
    }

    #[test]
    fn test_format_token_sets_specific_data() {
        let c = classify_by_keywords("Report", "Generate the weekly report in JSON", &real_search());
        assert_eq!(c.output_specificity, OutputSpecificity::SpecificData);
        assert_eq!(c.expected_data_format.as_deref(), Some("JSON"));

        let es = classify_by_keywords("Informe", "generate informe con formato tabla", &real_search());
        assert_eq!(es.output_specificity, OutputSpecificity::SpecificData);
        assert!(es.expected_data_format.is_none());
    }

    #[test]
    fn test_default_planning() {
        let c = classify_by_keywords("Kickoff", "Outline next quarter", &real_search());
        assert_eq!(c.execution_type, TaskExecutionType::Planning);
        assert_eq!(c.output_specificity, OutputSpecificity::Methodology);
        assert_eq!(c.confidence_score, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_word_prefix_matching() {
        // "specialist" must not trigger "list"
        let c = classify_by_keywords("Brief", "Brief the specialist team", &real_search());
        assert_eq!(c.execution_type, TaskExecutionType::Planning);

        let c = classify_by_keywords("Leads", "Collecting partner emails", &real_search());
        assert_eq!(c.execution_type, TaskExecutionType::DataCollection);
    }

    #[test]
    fn test_analysis_and_validation_keywords() {
        let a = classify_by_keywords("Pricing", "Compare competitor pricing", &real_search());
        assert_eq!(a.execution_type, TaskExecutionType::Analysis);
        let v = classify_by_keywords("QA", "Verify the landing page copy", &real_search());
        assert_eq!(v.execution_type, TaskExecutionType::Validation);
    }

    #[test]
    fn test_deterministic() {
        let a = classify_by_keywords("Leads", "collect 50 contacts in CSV", &fallback_only());
        let b = classify_by_keywords("Leads", "collect 50 contacts in CSV", &fallback_only());
        assert_eq!(a, b);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("export as csv please"), (true, Some("CSV".to_string())));
        assert_eq!(detect_format("nothing special"), (false, None));
        // token match only, not substrings
        assert_eq!(detect_format("jsonify the thing"), (false, None));
    }
}
