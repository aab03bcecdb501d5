//! HTTP request and response bodies

use crate::classifier::{TaskExecutionClassification, WorkspaceContext};
use crate::errors::PolicyError;
use crate::quality::{ComplianceReport, QualityAlert};
use crate::recovery::{RecoveryAnalysisResult, RecoveryDecision, RecoveryRequest, RecoveryStats};
use crate::tools::ToolDescriptor;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of the analyze and should-recover endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub task_id: String,
    pub workspace_id: String,
    pub error_message: String,
    #[serde(default)]
    pub error_type: String,

    /// Read from the stored task when absent
    #[serde(default)]
    pub retry_count: Option<u32>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub execution_stage: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

impl AnalyzeRequest {
    pub fn into_recovery_request(self, retry_count: u32) -> RecoveryRequest {
        RecoveryRequest {
            task_id: self.task_id,
            workspace_id: self.workspace_id,
            error_message: self.error_message,
            error_type: self.error_type,
            retry_count,
            agent_id: self.agent_id,
            task_name: self.task_name,
            task_description: self.task_description,
            execution_stage: self.execution_stage,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShouldRecoverRequest {
    #[serde(flatten)]
    pub request: AnalyzeRequest,
    #[serde(default)]
    pub include_analysis: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: RecoveryAnalysisResult,
}

#[derive(Debug, Serialize)]
pub struct ShouldRecoverResponse {
    pub success: bool,
    pub should_recover: bool,
    pub decision: RecoveryDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<RecoveryAnalysisResult>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: RecoveryStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceQuery {
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Body of the classify endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub task_name: String,
    #[serde(default)]
    pub task_description: String,
    pub workspace_id: String,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,

    /// Tool discovery answers when absent
    #[serde(default)]
    pub available_tools: Option<Vec<ToolDescriptor>>,
    #[serde(default)]
    pub workspace_context: Option<WorkspaceContext>,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub success: bool,
    pub classification: TaskExecutionClassification,
}

/// Body of the quality gate endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    pub workspace_id: String,
    pub operation_type: String,
    #[serde(default = "empty_object")]
    pub operation_data: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub can_proceed: bool,
    pub report: ComplianceReport,
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub success: bool,
    pub alerts: Vec<QualityAlert>,
}

/// Error rendered as `{"success": false, "error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        let status = match &err {
            PolicyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PolicyError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message, "Request rejected");
        }
        (
            self.status,
            Json(serde_json::json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_should_recover_flattens_request() {
        let body: ShouldRecoverRequest = serde_json::from_value(json!({
            "task_id": "t-1",
            "workspace_id": "ws-1",
            "error_message": "boom",
            "retry_count": 2,
            "include_analysis": true
        }))
        .unwrap();
        assert!(body.include_analysis);
        assert_eq!(body.request.retry_count, Some(2));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let result: std::result::Result<AnalyzeRequest, _> =
            serde_json::from_value(json!({"task_id": "t-1", "workspace_id": "ws-1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = PolicyError::InvalidInput("task_id is required".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err: ApiError = PolicyError::TaskNotFound("t-1".to_string()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
