// anthropic.rs: Hosted Anthropic messages backend.

use serde::{Deserialize, Serialize};

use sc_policy::PlannerConfig;

use super::{api_key, post_json, ChatBackend};
use crate::error::PlannerError;

const ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicBackend {
    config: PlannerConfig,
}

impl AnthropicBackend {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl ChatBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "Anthropic"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, PlannerError> {
        let key = api_key(&self.config)?;
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: [Message {
                role: "user",
                content: user,
            }],
        };
        let headers = [("x-api-key", key.as_str()), ("anthropic-version", API_VERSION)];

        let response: MessagesResponse = post_json(self.name(), ENDPOINT, &headers, &body)?;
        first_text(response)
    }
}

fn first_text(response: MessagesResponse) -> Result<String, PlannerError> {
    response
        .content
        .into_iter()
        .find_map(|block| block.text)
        .ok_or_else(|| {
            PlannerError::Connection("Anthropic request failed: response had no text block".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_block() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"id": "msg_1", "content": [{"type": "text", "text": "{\"steps\": []}"}], "stop_reason": "end_turn"}"#,
        )
        .unwrap();
        assert_eq!(first_text(response).unwrap(), r#"{"steps": []}"#);
    }

    #[test]
    fn request_puts_system_prompt_at_top_level() {
        let body = MessagesRequest {
            model: "claude",
            max_tokens: MAX_TOKENS,
            system: "sys",
            messages: [Message {
                role: "user",
                content: "task",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["system"], "sys");
        assert_eq!(value["max_tokens"], 1024);
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn missing_key_fails_before_sending() {
        let config = PlannerConfig {
            api_key_env_var: String::new(),
            ..Default::default()
        };
        let backend = AnthropicBackend::new(&config);
        assert!(matches!(
            backend.complete("sys", "task"),
            Err(PlannerError::Connection(_))
        ));
    }
}
