use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::vision::ChatResponse;
use super::{strip_code_fence, ChatEndpoint, ClientError};

/// Produces per-language descriptions of a dish name.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Returns `(lang_code, description)` pairs, one per requested
    /// language that the backend could produce.
    async fn translate(
        &self,
        text: &str,
        target_langs: &[String],
    ) -> Result<Vec<(String, String)>, ClientError>;
}

/// Translator speaking the chat-completions protocol.
pub struct ChatTranslator {
    http: reqwest::Client,
    endpoint: ChatEndpoint,
}

impl ChatTranslator {
    pub fn new(endpoint: ChatEndpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl Translator for ChatTranslator {
    async fn translate(
        &self,
        text: &str,
        target_langs: &[String],
    ) -> Result<Vec<(String, String)>, ClientError> {
        let prompt = format!(
            "Translate the restaurant dish name {:?} into each of these \
             language codes: {}. Reply with a JSON object mapping each code \
             to a short natural description a diner would understand, and \
             nothing else.",
            text,
            target_langs.join(", ")
        );
        let body = json!({
            "model": self.endpoint.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let url = format!("{}/chat/completions", self.endpoint.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.endpoint.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                service: "translate",
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                service: "translate",
                detail: format!("status {}", status),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| ClientError::Protocol {
            service: "translate",
            detail: e.to_string(),
        })?;
        let content = chat.first_content().ok_or_else(|| ClientError::Protocol {
            service: "translate",
            detail: "no choices in response".into(),
        })?;

        let pairs = parse_translations(content, target_langs)?;
        info!(text, produced = pairs.len(), "translation complete");
        Ok(pairs)
    }
}

/// Parse the reply object, keeping only the languages we asked for and
/// in the order we asked for them.
fn parse_translations(
    content: &str,
    target_langs: &[String],
) -> Result<Vec<(String, String)>, ClientError> {
    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(strip_code_fence(content)).map_err(|e| ClientError::Protocol {
            service: "translate",
            detail: format!("bad translation payload: {}", e),
        })?;

    Ok(target_langs
        .iter()
        .filter_map(|lang| {
            map.get(lang)
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(|s| (lang.clone(), s.trim().to_string()))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn keeps_requested_languages_in_order() {
        let pairs = parse_translations(
            r#"{"ja": "チャーハン", "en": "Fried Rice", "fr": "Riz frit"}"#,
            &langs(&["en", "ja"]),
        )
        .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("en".to_string(), "Fried Rice".to_string()),
                ("ja".to_string(), "チャーハン".to_string()),
            ]
        );
    }

    #[test]
    fn missing_and_blank_languages_are_skipped() {
        let pairs =
            parse_translations(r#"{"en": "   "}"#, &langs(&["en", "ja"])).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn fenced_object_parses() {
        let pairs = parse_translations(
            "```json\n{\"en\": \"Soup\"}\n```",
            &langs(&["en"]),
        )
        .unwrap();
        assert_eq!(pairs, vec![("en".to_string(), "Soup".to_string())]);
    }

    #[test]
    fn non_object_payload_is_protocol_error() {
        let err = parse_translations("[1,2]", &langs(&["en"])).unwrap_err();
        assert!(matches!(err, ClientError::Protocol { .. }));
    }
}
