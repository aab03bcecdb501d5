//! Telemetry for TaskGuard
//!
//! In-process counters and a bounded event log feeding the health and stats
//! endpoints. Cheap to clone; clones share state.

use crate::history::BoundedHistory;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Maximum events retained
const EVENT_CAPACITY: usize = 500;

/// Policy component that emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Recovery,
    Classifier,
    QualityGates,
}

/// How an AI call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiOutcome {
    Success,
    Failure,
    Timeout,
}

/// Telemetry event types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    AiCall {
        component: Component,
        outcome: AiOutcome,
        duration_ms: u64,
    },
    AnalysisCompleted {
        decision: String,
        duration_ms: u64,
    },
    ClassificationCompleted {
        execution_type: String,
        fallback_used: bool,
    },
    ValidationCompleted {
        compliance_score: u8,
        blocking: bool,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct TelemetryStats {
    pub ai_calls: usize,
    pub ai_failures: usize,
    pub ai_timeouts: usize,
    pub total_ai_latency_ms: u64,
    pub analyses: usize,
    pub total_analysis_latency_ms: u64,
    pub classifications: usize,
    pub fallback_classifications: usize,
    pub validations: usize,
    pub blocked_validations: usize,
}

impl TelemetryStats {
    /// Mean AI call latency over all calls
    pub fn average_ai_latency_ms(&self) -> f64 {
        if self.ai_calls == 0 {
            0.0
        } else {
            self.total_ai_latency_ms as f64 / self.ai_calls as f64
        }
    }

    /// Mean recovery analysis latency
    pub fn average_analysis_latency_ms(&self) -> f64 {
        if self.analyses == 0 {
            0.0
        } else {
            self.total_analysis_latency_ms as f64 / self.analyses as f64
        }
    }

    /// Share of AI calls that did not succeed
    pub fn ai_failure_rate(&self) -> f64 {
        if self.ai_calls == 0 {
            0.0
        } else {
            (self.ai_failures + self.ai_timeouts) as f64 / self.ai_calls as f64
        }
    }
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: BoundedHistory<TelemetryEvent>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: BoundedHistory::new(EVENT_CAPACITY),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = self.stats();
            match &event {
                TelemetryEvent::AiCall {
                    outcome,
                    duration_ms,
                    ..
                } => {
                    stats.ai_calls += 1;
                    stats.total_ai_latency_ms += duration_ms;
                    match outcome {
                        AiOutcome::Success => {}
                        AiOutcome::Failure => stats.ai_failures += 1,
                        AiOutcome::Timeout => stats.ai_timeouts += 1,
                    }
                }
                TelemetryEvent::AnalysisCompleted { duration_ms, .. } => {
                    stats.analyses += 1;
                    stats.total_analysis_latency_ms += duration_ms;
                }
                TelemetryEvent::ClassificationCompleted { fallback_used, .. } => {
                    stats.classifications += 1;
                    if *fallback_used {
                        stats.fallback_classifications += 1;
                    }
                }
                TelemetryEvent::ValidationCompleted { blocking, .. } => {
                    stats.validations += 1;
                    if *blocking {
                        stats.blocked_validations += 1;
                    }
                }
            }
        }

        self.events.push(event);
    }

    /// Record the end of an AI call
    pub fn record_ai_call(&self, component: Component, outcome: AiOutcome, elapsed: Duration) {
        self.record(TelemetryEvent::AiCall {
            component,
            outcome,
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats().clone()
    }

    /// Get elapsed time since start
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        self.events.recent(n)
    }

    fn stats(&self) -> MutexGuard<'_, TelemetryStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_call_accounting() {
        let telemetry = TelemetryCollector::new();
        telemetry.record_ai_call(Component::Recovery, AiOutcome::Success, Duration::from_millis(100));
        telemetry.record_ai_call(Component::Classifier, AiOutcome::Timeout, Duration::from_millis(300));
        telemetry.record_ai_call(Component::Classifier, AiOutcome::Failure, Duration::from_millis(200));

        let stats = telemetry.get_stats();
        assert_eq!(stats.ai_calls, 3);
        assert_eq!(stats.ai_timeouts, 1);
        assert_eq!(stats.ai_failures, 1);
        assert_eq!(stats.average_ai_latency_ms(), 200.0);
        assert!((stats.ai_failure_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_component_counters() {
        let telemetry = TelemetryCollector::new();
        telemetry.record(TelemetryEvent::AnalysisCompleted {
            decision: "RETRY".to_string(),
            duration_ms: 4,
        });
        telemetry.record(TelemetryEvent::ClassificationCompleted {
            execution_type: "PLANNING".to_string(),
            fallback_used: true,
        });
        telemetry.record(TelemetryEvent::ValidationCompleted {
            compliance_score: 62,
            blocking: true,
        });

        let stats = telemetry.get_stats();
        assert_eq!(stats.analyses, 1);
        assert_eq!(stats.average_analysis_latency_ms(), 4.0);
        assert_eq!(stats.fallback_classifications, 1);
        assert_eq!(stats.blocked_validations, 1);
        assert_eq!(telemetry.event_count(), 3);
    }

    #[test]
    fn test_empty_averages() {
        let stats = TelemetryStats::default();
        assert_eq!(stats.average_ai_latency_ms(), 0.0);
        assert_eq!(stats.average_analysis_latency_ms(), 0.0);
        assert_eq!(stats.ai_failure_rate(), 0.0);
    }

    #[test]
    fn test_clones_share_stats() {
        let telemetry = TelemetryCollector::new();
        let clone = telemetry.clone();
        clone.record_ai_call(Component::QualityGates, AiOutcome::Success, Duration::ZERO);
        assert_eq!(telemetry.get_stats().ai_calls, 1);
        assert_eq!(telemetry.recent_events(10).len(), 1);
    }
}
