//! Text-generation backends.
//!
//! A backend turns a system prompt and a user message into raw text. The
//! planner never looks at HTTP details; it only needs [`ChatBackend::endpoint`]
//! for the network gate and [`ChatBackend::complete`] for the answer.
//!
//! All HTTP backends are blocking, use a 60 second per-call deadline, and do
//! not retry.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use sc_policy::{PlannerBackend, PlannerConfig};

use crate::error::PlannerError;

pub mod anthropic;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// Per-call deadline for backend requests.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub trait ChatBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// URL the backend sends requests to.
    fn endpoint(&self) -> &str;

    fn complete(&self, system: &str, user: &str) -> Result<String, PlannerError>;
}

/// The backend selected by `config.backend`.
pub fn for_config(config: &PlannerConfig) -> Box<dyn ChatBackend> {
    match config.backend {
        PlannerBackend::Ollama => Box::new(OllamaBackend::new(config)),
        PlannerBackend::OpenAi => Box::new(OpenAiBackend::new(config)),
        PlannerBackend::Anthropic => Box::new(AnthropicBackend::new(config)),
    }
}

/// Whether `endpoint` points at this machine: `localhost`, `127.0.0.0/8`, or
/// `::1`. Unparseable URLs are not loopback.
pub fn is_loopback(endpoint: &str) -> bool {
    let Ok(url) = Url::parse(endpoint) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

/// Read the API key from the environment variable named in the policy.
pub(crate) fn api_key(config: &PlannerConfig) -> Result<String, PlannerError> {
    let var = config.api_key_env_var.as_str();
    let key = if var.is_empty() {
        String::new()
    } else {
        std::env::var(var).unwrap_or_default()
    };
    if key.is_empty() {
        return Err(PlannerError::Connection(format!(
            "No API key found. Set the '{var}' environment variable."
        )));
    }
    Ok(key)
}

/// POST `body` as JSON and decode the JSON answer.
pub(crate) fn post_json<B, R>(
    label: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: &B,
) -> Result<R, PlannerError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let failed = |e: reqwest::Error| PlannerError::Connection(format!("{label} request failed: {e}"));

    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(failed)?;

    let mut request = client.post(url).json(body);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    tracing::debug!("sending planner request to {} ({})", label, url);
    let response = request.send().map_err(|e| {
        if e.is_connect() {
            PlannerError::Connection(format!("Cannot reach {label} at {url}: {e}"))
        } else {
            failed(e)
        }
    })?;

    response
        .error_for_status()
        .map_err(failed)?
        .json::<R>()
        .map_err(failed)
}
