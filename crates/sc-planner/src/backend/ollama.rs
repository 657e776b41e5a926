// ollama.rs: Local Ollama chat backend (`/api/chat`, non-streaming).

use serde::{Deserialize, Serialize};

use sc_policy::PlannerConfig;

use super::{post_json, ChatBackend};
use crate::error::PlannerError;

/// Request body for Ollama's `/api/chat` endpoint.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    /// Single response object instead of a stream of chunks.
    stream: bool,
    /// Ask the model to emit JSON only.
    format: &'a str,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct OllamaBackend {
    model: String,
    endpoint: String,
}

impl OllamaBackend {
    /// Uses `config.base_url`, which is the only backend setting that can
    /// redirect requests.
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            model: config.model.clone(),
            endpoint: format!("{}/api/chat", config.base_url.trim_end_matches('/')),
        }
    }

    fn request<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
            stream: false,
            format: "json",
        }
    }
}

impl ChatBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, PlannerError> {
        let response: ChatResponse =
            post_json(self.name(), &self.endpoint, &[], &self.request(system, user))?;
        Ok(response.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_follows_base_url() {
        let config = PlannerConfig {
            base_url: "http://127.0.0.1:11434/".into(),
            ..Default::default()
        };
        assert_eq!(
            OllamaBackend::new(&config).endpoint(),
            "http://127.0.0.1:11434/api/chat"
        );
    }

    #[test]
    fn request_is_non_streaming_json() {
        let backend = OllamaBackend::new(&PlannerConfig::default());
        let body = serde_json::to_value(backend.request("sys", "task")).unwrap();
        assert_eq!(body["model"], "qwen2.5-coder:14b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "task");
    }

    #[test]
    fn response_content_is_extracted() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"model": "m", "message": {"role": "assistant", "content": "{\"steps\": []}"}, "done": true}"#,
        )
        .unwrap();
        assert_eq!(response.message.content, r#"{"steps": []}"#);
    }
}
