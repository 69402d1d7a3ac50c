use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::model::{StagedItem, Translation};

use super::{strip_code_fence, ChatEndpoint, ClientError};

/// Extracts structured menu items from a photographed menu.
#[async_trait]
pub trait MenuRecognizer: Send + Sync {
    /// `image_b64` is the base64-encoded image payload, no data-URL prefix.
    async fn recognize(&self, image_b64: &str) -> Result<Vec<StagedItem>, ClientError>;
}

const RECOGNIZE_PROMPT: &str = "You are reading a photograph of a restaurant menu. \
Extract every dish as a JSON array. Each element: \
{\"item_name\": string, \"price_big\": integer or null, \
\"price_small\": integer or null}. Prices are whole currency units; when \
the menu shows a single price, put it in price_small. Reply with the JSON \
array only.";

/// Vision recognizer speaking the chat-completions protocol.
pub struct ChatRecognizer {
    http: reqwest::Client,
    endpoint: ChatEndpoint,
}

impl ChatRecognizer {
    pub fn new(endpoint: ChatEndpoint) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl MenuRecognizer for ChatRecognizer {
    async fn recognize(&self, image_b64: &str) -> Result<Vec<StagedItem>, ClientError> {
        let body = json!({
            "model": self.endpoint.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": RECOGNIZE_PROMPT},
                    {"type": "image_url", "image_url": {
                        "url": format!("data:image/jpeg;base64,{}", image_b64)
                    }},
                ],
            }],
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
                service: "vision",
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Http {
                service: "vision",
                detail: format!("status {}", status),
            });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| ClientError::Protocol {
            service: "vision",
            detail: e.to_string(),
        })?;
        let content = chat.first_content().ok_or_else(|| ClientError::Protocol {
            service: "vision",
            detail: "no choices in response".into(),
        })?;
        debug!(len = content.len(), "vision reply received");

        let items = parse_recognized(content)?;
        info!(items = items.len(), "menu recognition complete");
        Ok(items)
    }
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl ChatResponse {
    pub(crate) fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Deserialize)]
struct RecognizedItem {
    item_name: String,
    #[serde(default)]
    price_big: Option<i64>,
    #[serde(default)]
    price_small: Option<i64>,
}

/// Parse the model's JSON array into staged items. Blank names are
/// dropped rather than failing the whole batch.
fn parse_recognized(content: &str) -> Result<Vec<StagedItem>, ClientError> {
    let raw: Vec<RecognizedItem> =
        serde_json::from_str(strip_code_fence(content)).map_err(|e| ClientError::Protocol {
            service: "vision",
            detail: format!("bad item payload: {}", e),
        })?;

    Ok(raw
        .into_iter()
        .filter(|r| !r.item_name.trim().is_empty())
        .map(|r| StagedItem {
            item_name: r.item_name.trim().to_string(),
            price_big: r.price_big,
            price_small: r.price_small,
            translated_desc: None,
            translations: Vec::<Translation>::new(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_array() {
        let items = parse_recognized(
            r#"[{"item_name": "小籠包", "price_small": 220},
                {"item_name": "炒飯", "price_big": 200, "price_small": 150}]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_name, "小籠包");
        assert_eq!(items[0].price_small, Some(220));
        assert_eq!(items[0].price_big, None);
        assert_eq!(items[1].price_big, Some(200));
    }

    #[test]
    fn parses_fenced_array_and_drops_blank_names() {
        let items = parse_recognized(
            "```json\n[{\"item_name\": \"  \"}, {\"item_name\": \"Soup\"}]\n```",
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_name, "Soup");
    }

    #[test]
    fn rejects_non_array_payload() {
        let err = parse_recognized("{\"oops\": true}").unwrap_err();
        assert!(matches!(err, ClientError::Protocol { .. }));
    }
}
