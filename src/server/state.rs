//! Component wiring
//!
//! Every component is built once here and shared behind `Arc`. The process
//! entry point owns the result; nothing is constructed at import time.

use crate::ai::{CompletionProvider, OllamaProvider};
use crate::classifier::TaskExecutionClassifier;
use crate::config::Config;
use crate::errors::Result;
use crate::history::BoundedHistory;
use crate::quality::QualityGateValidator;
use crate::recovery::RecoveryDecisionEngine;
use crate::store::{InMemoryTaskStore, TaskStore};
use crate::telemetry::TelemetryCollector;
use crate::tools::{StaticToolDiscovery, ToolDiscovery};
use std::sync::Arc;

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub recovery: Arc<RecoveryDecisionEngine>,
    pub classifier: Arc<TaskExecutionClassifier>,
    pub quality: Arc<QualityGateValidator>,
    pub store: Arc<dyn TaskStore>,
    pub discovery: Arc<dyn ToolDiscovery>,
    pub telemetry: TelemetryCollector,
}

impl AppState {
    /// Build every component from configuration, with an in-memory task store
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_store(config, Arc::new(InMemoryTaskStore::new()))
    }

    /// Build every component from configuration around an existing task store
    pub fn with_store(config: &Config, store: Arc<dyn TaskStore>) -> Result<Self> {
        let telemetry = TelemetryCollector::new();

        let provider: Option<Arc<dyn CompletionProvider>> = if config.ai.enabled {
            let provider = OllamaProvider::with_config(&config.ai.base_url, &config.ai.model)?;
            tracing::info!(
                base_url = %config.ai.base_url,
                model = %config.ai.model,
                timeout_secs = config.ai.timeout_secs,
                "AI provider configured"
            );
            Some(Arc::new(provider))
        } else {
            tracing::info!("AI provider disabled; using local fallbacks");
            None
        };

        let mut recovery = RecoveryDecisionEngine::with_config(
            config.recovery.clone(),
            BoundedHistory::new(config.recovery.history_capacity),
        )?
        .with_telemetry(telemetry.clone());

        let mut classifier = TaskExecutionClassifier::new()
            .with_ai_enabled(config.classifier.ai_enabled)
            .with_telemetry(telemetry.clone());

        if let Some(provider) = provider {
            recovery = recovery.with_ai(provider.clone(), config.ai.timeout());
            classifier = classifier.with_ai(provider, config.ai.timeout());
        }

        let quality = QualityGateValidator::with_config(
            &config.quality,
            BoundedHistory::new(config.quality.alert_history_capacity),
        )
        .with_telemetry(telemetry.clone());

        Ok(Self {
            recovery: Arc::new(recovery),
            classifier: Arc::new(classifier),
            quality: Arc::new(quality),
            store,
            discovery: Arc::new(StaticToolDiscovery::new(config.tools.available.clone())),
            telemetry,
        })
    }
}
