// openai.rs: Hosted OpenAI chat completions backend.

use serde::{Deserialize, Serialize};

use sc_policy::PlannerConfig;

use super::{api_key, post_json, ChatBackend};
use crate::error::PlannerError;

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiBackend {
    config: PlannerConfig,
}

impl OpenAiBackend {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, PlannerError> {
        let key = api_key(&self.config)?;
        let auth = format!("Bearer {key}");
        let body = CompletionRequest {
            model: &self.config.model,
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
            temperature: 0.1,
        };

        let response: CompletionResponse =
            post_json(self.name(), ENDPOINT, &[("Authorization", auth.as_str())], &body)?;
        first_choice(response)
    }
}

fn first_choice(response: CompletionResponse) -> Result<String, PlannerError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| PlannerError::Connection("OpenAI request failed: response had no choices".into()))
}
