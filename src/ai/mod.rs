//! AI provider access for the policy components
//!
//! Every AI call goes through [`complete_json_with_timeout`], which bounds the
//! call with a deadline and turns timeouts, transport errors and malformed
//! replies into `PolicyError` values the caller then recovers from locally.

pub mod json;
pub mod provider;

pub use json::{extract_json_object, parse_json_reply};
pub use provider::{CompletionProvider, OllamaProvider, ResponseFormat};

use crate::errors::{PolicyError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Complete a prompt, failing with `AiTimeout` once `timeout` elapses
pub async fn complete_with_timeout(
    provider: &dyn CompletionProvider,
    prompt: &str,
    format: ResponseFormat,
    timeout: Duration,
) -> Result<String> {
    match tokio::time::timeout(timeout, provider.complete(prompt, format)).await {
        Ok(result) => result,
        Err(_) => Err(PolicyError::AiTimeout {
            duration_ms: timeout.as_millis() as u64,
        }),
    }
}

/// Complete a prompt as JSON and deserialize the reply
pub async fn complete_json_with_timeout<T: DeserializeOwned>(
    provider: &dyn CompletionProvider,
    prompt: &str,
    timeout: Duration,
) -> Result<T> {
    let reply = complete_with_timeout(provider, prompt, ResponseFormat::Json, timeout).await?;
    parse_json_reply(&reply)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Reply {
        ok: bool,
    }

    #[tokio::test]
    async fn test_json_reply_parsed() {
        let provider = FixedProvider::new(r#"{"ok": true}"#);
        let reply: Reply =
            complete_json_with_timeout(&provider, "p", Duration::from_secs(1)).await.unwrap();
        assert!(reply.ok);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_enforced() {
        let err = complete_with_timeout(
            &SlowProvider,
            "p",
            ResponseFormat::Json,
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PolicyError::AiTimeout { duration_ms: 20 }));
    }

    #[tokio::test]
    async fn test_garbage_reply_is_error() {
        let provider = FixedProvider::new("I cannot help with that");
        let result: Result<Reply> =
            complete_json_with_timeout(&provider, "p", Duration::from_secs(1)).await;
        assert!(result.unwrap_err().is_ai_failure());
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let result: Result<Reply> =
            complete_json_with_timeout(&FailingProvider, "p", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(PolicyError::AiUnavailable(_))));
    }
}
