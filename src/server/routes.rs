//! HTTP handlers

use crate::classifier::WorkspaceContext;
use crate::quality::Operation;
use crate::recovery::RecoveryAnalysisResult;
use crate::server::state::AppState;
use crate::server::types::{
    AlertsResponse, AnalyzeRequest, AnalyzeResponse, ApiError, ClassifyRequest, ClassifyResponse,
    ShouldRecoverRequest, ShouldRecoverResponse, StatsResponse, ValidateRequest, ValidateResponse,
    WorkspaceQuery,
};
use crate::store::TaskStore;
use crate::tools::ToolInventory;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};

/// Alerts returned when no limit is given
const DEFAULT_ALERT_LIMIT: usize = 50;

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/api/recovery-analysis/analyze", post(analyze))
        .route("/api/recovery-analysis/should-recover", post(should_recover))
        .route("/api/recovery-analysis/stats", get(recovery_stats))
        .route("/api/recovery-analysis/health", get(recovery_health))
        .route("/api/task-execution/classify", post(classify))
        .route("/api/quality-gates/validate", post(validate))
        .route("/api/quality-gates/alerts", get(quality_alerts))
        .with_state(state)
}

async fn liveness() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "taskguard",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/recovery-analysis/analyze
async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<AnalyzeResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let analysis = run_analysis(&state, body).await?;
    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
    }))
}

/// POST /api/recovery-analysis/should-recover
async fn should_recover(
    State(state): State<AppState>,
    body: Result<Json<ShouldRecoverRequest>, JsonRejection>,
) -> ApiResult<ShouldRecoverResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let analysis = run_analysis(&state, body.request).await?;
    Ok(Json(ShouldRecoverResponse {
        success: true,
        should_recover: analysis.should_retry(),
        decision: analysis.recovery_decision,
        analysis: body.include_analysis.then_some(analysis),
    }))
}

/// Enrich from the task store, decide, then write the verdict back
async fn run_analysis(
    state: &AppState,
    mut body: AnalyzeRequest,
) -> std::result::Result<RecoveryAnalysisResult, ApiError> {
    let stored = state.store.get_task(&body.task_id).await.ok();

    if let Some(task) = &stored {
        if body.task_name.is_none() {
            body.task_name = Some(task.name.clone());
        }
        if body.task_description.is_none() && !task.description.is_empty() {
            body.task_description = Some(task.description.clone());
        }
    }
    let retry_count = body.retry_count.unwrap_or_else(|| {
        stored
            .as_ref()
            .and_then(|t| t.fields.get("retry_count"))
            .and_then(Value::as_u64)
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    });

    let analysis = state
        .recovery
        .analyze(&body.into_recovery_request(retry_count))
        .await?;

    if stored.is_some() {
        write_back(state.store.as_ref(), &analysis).await;
    }
    Ok(analysis)
}

async fn write_back(store: &dyn TaskStore, analysis: &RecoveryAnalysisResult) {
    let mut fields = Map::new();
    fields.insert(
        "recovery_decision".to_string(),
        json!(analysis.recovery_decision),
    );
    fields.insert(
        "recovery_strategy".to_string(),
        json!(analysis.recovery_strategy),
    );
    fields.insert(
        "recovery_confidence".to_string(),
        json!(analysis.confidence_score),
    );
    fields.insert(
        "retry_after_seconds".to_string(),
        json!(analysis.recommended_delay_seconds),
    );

    if let Err(e) = store.update_task_fields(&analysis.task_id, fields).await {
        tracing::warn!(task_id = %analysis.task_id, error = %e, "Failed to record recovery decision on task");
    }
}

/// GET /api/recovery-analysis/stats
async fn recovery_stats(
    State(state): State<AppState>,
    query: Result<Query<WorkspaceQuery>, QueryRejection>,
) -> ApiResult<StatsResponse> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(StatsResponse {
        success: true,
        stats: state.recovery.stats(query.workspace_id.as_deref()),
    }))
}

/// GET /api/recovery-analysis/health
async fn recovery_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "health": state.recovery.health(),
        "telemetry": state.telemetry.get_stats(),
        "uptime_secs": state.telemetry.uptime().as_secs(),
    }))
}

/// POST /api/task-execution/classify
async fn classify(
    State(state): State<AppState>,
    body: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<ClassifyResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if body.task_name.trim().is_empty() {
        return Err(ApiError::bad_request("task_name is required"));
    }

    let tools = match body.available_tools {
        Some(tools) => tools,
        None => {
            let agent = body.agent.as_deref().unwrap_or("default");
            let domain = body.domain.as_deref().unwrap_or("general");
            match state
                .discovery
                .get_tools_for_agent(agent, domain, &body.workspace_id)
                .await
            {
                Ok(tools) => tools,
                Err(e) => {
                    // No tools means no data collection; the downgrade handles the rest.
                    tracing::warn!(agent, domain, error = %e, "Tool discovery failed");
                    Vec::new()
                }
            }
        }
    };

    let mut workspace = body
        .workspace_context
        .unwrap_or_else(|| WorkspaceContext::new(body.workspace_id.clone()));
    if workspace.workspace_id.is_empty() {
        workspace.workspace_id = body.workspace_id.clone();
    }
    if workspace.domain.is_none() {
        workspace.domain = body.domain.clone();
    }

    let classification = state
        .classifier
        .classify(
            &body.task_name,
            &body.task_description,
            &ToolInventory::new(tools),
            &workspace,
        )
        .await;

    Ok(Json(ClassifyResponse {
        success: true,
        classification,
    }))
}

/// POST /api/quality-gates/validate
async fn validate(
    State(state): State<AppState>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> ApiResult<ValidateResponse> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let operation = Operation::from_parts(&body.operation_type, body.operation_data)?;
    let (can_proceed, report) = state.quality.validate(&operation, &body.workspace_id);
    Ok(Json(ValidateResponse {
        success: true,
        can_proceed,
        report,
    }))
}

/// GET /api/quality-gates/alerts
async fn quality_alerts(
    State(state): State<AppState>,
    query: Result<Query<WorkspaceQuery>, QueryRejection>,
) -> ApiResult<AlertsResponse> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(Json(AlertsResponse {
        success: true,
        alerts: state.quality.alerts(
            query.workspace_id.as_deref(),
            query.limit.unwrap_or(DEFAULT_ALERT_LIMIT),
        ),
    }))
}
