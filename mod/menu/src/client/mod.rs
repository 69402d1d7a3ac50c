//! Outbound AI collaborators: vision recognition and description
//! translation. Both are trait objects so the server runs fine with
//! either (or both) disabled.

pub mod translate;
pub mod vision;

use async_trait::async_trait;
use thiserror::Error;

use menuerp_core::ServiceError;

use crate::model::StagedItem;

pub use translate::{ChatTranslator, Translator};
pub use vision::{ChatRecognizer, MenuRecognizer};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The collaborator is not configured on this deployment.
    #[error("{0} is not configured")]
    Disabled(&'static str),

    #[error("request to {service} failed: {detail}")]
    Http { service: &'static str, detail: String },

    /// The upstream answered, but not in the shape we asked for.
    #[error("unexpected {service} response: {detail}")]
    Protocol { service: &'static str, detail: String },
}

impl From<ClientError> for ServiceError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Disabled(_) => ServiceError::Validation(e.to_string()),
            ClientError::Http { .. } | ClientError::Protocol { .. } => {
                ServiceError::Internal(e.to_string())
            }
        }
    }
}

/// Shared settings for a chat-completions style endpoint.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Model replies often wrap JSON in a markdown fence; strip it before
/// parsing.
pub(crate) fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// A recognizer that always reports itself unavailable. Installed when
/// no vision endpoint is configured.
pub struct DisabledRecognizer;

#[async_trait]
impl MenuRecognizer for DisabledRecognizer {
    async fn recognize(&self, _image_b64: &str) -> Result<Vec<StagedItem>, ClientError> {
        Err(ClientError::Disabled("menu recognition"))
    }
}

/// Translator counterpart of [`DisabledRecognizer`].
pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(
        &self,
        _text: &str,
        _target_langs: &[String],
    ) -> Result<Vec<(String, String)>, ClientError> {
        Err(ClientError::Disabled("translation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_stripping() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1,2]\n```"), "[1,2]");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn disabled_recognizer_reports_itself() {
        let err = DisabledRecognizer.recognize("").await.unwrap_err();
        assert!(matches!(err, ClientError::Disabled(_)));
        let svc: ServiceError = err.into();
        assert!(matches!(svc, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn disabled_translator_reports_itself() {
        let err = DisabledTranslator
            .translate("x", &["en".into()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "translation is not configured");
    }
}
