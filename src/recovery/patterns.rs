//! Failure signature matching
//!
//! Maps an error message to the first known failure signature in a fixed,
//! ordered table. Transient signatures lead the table, so a timeout or rate
//! limit always backs off even when the message also mentions validation.
//! Guardrail signatures sit ahead of the generic agent-error signature.
//!
//! Within a signature, `patterns` are alternatives (any one may match) and
//! `all_of` patterns are conjunctive (every one must match).

use crate::errors::{PolicyError, Result};
use crate::recovery::types::{SignatureClass, SignatureSpec};
use regex::{Regex, RegexBuilder};

/// Success rate assumed when no signature matches
pub const DEFAULT_SUCCESS_RATE: f64 = 0.5;

/// Pattern id reported when no signature matches
pub const UNKNOWN_PATTERN_ID: &str = "unknown";

/// One known class of task failure; immutable once loaded
#[derive(Debug, Clone)]
pub struct FailureSignature {
    pub pattern_id: String,
    matchers: Vec<Regex>,
    required: Vec<Regex>,
    pub historical_success_rate: f64,
    pub class: SignatureClass,
}

impl FailureSignature {
    /// Compile a signature from its configuration form
    pub fn from_spec(spec: &SignatureSpec) -> Result<Self> {
        if spec.pattern_id.trim().is_empty() {
            return Err(PolicyError::ConfigError(
                "signature pattern_id must not be empty".to_string(),
            ));
        }
        if spec.patterns.is_empty() && spec.all_of.is_empty() {
            return Err(PolicyError::ConfigError(format!(
                "signature '{}' has no patterns",
                spec.pattern_id
            )));
        }
        if !(0.0..=1.0).contains(&spec.historical_success_rate) {
            return Err(PolicyError::ConfigError(format!(
                "signature '{}' success rate must be between 0.0 and 1.0",
                spec.pattern_id
            )));
        }

        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            PolicyError::ConfigError(format!(
                                "signature '{}' pattern '{}': {}",
                                spec.pattern_id, p, e
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()
        };

        Ok(Self {
            pattern_id: spec.pattern_id.clone(),
            matchers: compile(&spec.patterns)?,
            required: compile(&spec.all_of)?,
            historical_success_rate: spec.historical_success_rate,
            class: spec.class,
        })
    }

    /// Fallback signature used when nothing matches
    pub fn unknown() -> Self {
        Self {
            pattern_id: UNKNOWN_PATTERN_ID.to_string(),
            matchers: Vec::new(),
            required: Vec::new(),
            historical_success_rate: DEFAULT_SUCCESS_RATE,
            class: SignatureClass::Generic,
        }
    }

    /// Whether any alternative and every required pattern hit the message
    pub fn matches(&self, error_message: &str) -> bool {
        if self.matchers.is_empty() && self.required.is_empty() {
            return false;
        }
        (self.matchers.is_empty() || self.matchers.iter().any(|m| m.is_match(error_message)))
            && self.required.iter().all(|m| m.is_match(error_message))
    }
}

/// Built-in signature table, in priority order
pub fn default_signatures() -> Vec<SignatureSpec> {
    let spec = |id: &str, patterns: &[&str], rate: f64, class: SignatureClass| SignatureSpec {
        pattern_id: id.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        all_of: Vec::new(),
        historical_success_rate: rate,
        class,
    };

    vec![
        spec(
            "transient_network",
            &[
                r"time(d)?\s*out",
                r"connection",
                r"rate[\s_-]?limit",
                r"too many requests",
                r"\b(429|502|503|504)\b",
            ],
            0.8,
            SignatureClass::Transient,
        ),
        spec(
            "guardrail_validation",
            &[
                r"guardrail",
                r"tripwire",
                r"validation",
                r"orchestrationcontext",
                r"field\s+(is\s+)?(missing|required)",
            ],
            0.85,
            SignatureClass::Guardrail,
        ),
        spec(
            "task_obsolete",
            &[
                r"already (been )?completed",
                r"duplicate task",
                r"no longer (needed|relevant|required)",
            ],
            0.9,
            SignatureClass::Obsolete,
        ),
        spec(
            "quota_exhausted",
            &[r"insufficient[_\s]quota", r"quota exceeded", r"billing"],
            0.2,
            SignatureClass::Generic,
        ),
        spec(
            "max_turns_exceeded",
            &[r"max(imum)?[_\s]?turns"],
            0.4,
            SignatureClass::Generic,
        ),
        spec(
            "malformed_output",
            &[r"json", r"parse error", r"malformed", r"unexpected token"],
            0.6,
            SignatureClass::Generic,
        ),
        spec(
            "agent_error",
            &[r"agent", r"execution failed"],
            0.5,
            SignatureClass::Generic,
        ),
    ]
}

/// Ordered, first-match signature lookup
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    signatures: Vec<FailureSignature>,
    default_signature: FailureSignature,
}

impl PatternMatcher {
    /// Matcher over the built-in table
    pub fn new() -> Self {
        // The built-in table is covered by tests, so compiling it cannot fail.
        Self::from_specs(&default_signatures()).unwrap_or_else(|_| Self {
            signatures: Vec::new(),
            default_signature: FailureSignature::unknown(),
        })
    }

    /// Matcher over a configured table; empty input selects the built-ins
    pub fn from_specs(specs: &[SignatureSpec]) -> Result<Self> {
        if specs.is_empty() {
            return Self::from_specs(&default_signatures());
        }
        let signatures = specs
            .iter()
            .map(FailureSignature::from_spec)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            signatures,
            default_signature: FailureSignature::unknown(),
        })
    }

    /// First signature matching the message, if any
    pub fn find(&self, error_message: &str) -> Option<&FailureSignature> {
        self.signatures.iter().find(|s| s.matches(error_message))
    }

    /// Matching signature, or the 50% default signature
    pub fn match_or_default(&self, error_message: &str) -> &FailureSignature {
        self.find(error_message).unwrap_or(&self.default_signature)
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn signatures(&self) -> &[FailureSignature] {
        &self.signatures
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}
