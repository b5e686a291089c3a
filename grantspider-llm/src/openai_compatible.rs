//! Generic OpenAI-compatible chat-completions client.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use grantspider_core::{GrantSpiderError, Llm, LlmRequest, LlmResponse, Message};

use crate::transport_error;

/// Request body for the chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

#[derive(Deserialize, Debug, Clone)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug, Clone)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize, Debug, Clone)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
struct OpenAiError {
    error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
struct ErrorDetail {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    default_model: String,
    temperature: Option<f32>,
    timeout: Duration,
}

impl fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };
        f.debug_struct("OpenAiCompatibleClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &api_key)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Default)]
pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    default_model: Option<String>,
    temperature: Option<f32>,
    timeout: Option<Duration>,
}

impl OpenAiCompatibleBuilder {
    pub fn base_url(mut self, value: impl AsRef<str>) -> Result<Self, GrantSpiderError> {
        let url = Url::parse(value.as_ref())
            .map_err(|err| GrantSpiderError::InvalidConfig(format!("base_url: {err}")))?;
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        self.api_key = if value.trim().is_empty() {
            None
        } else {
            Some(SecretString::new(value))
        };
        self
    }

    pub fn default_model(mut self, value: impl Into<String>) -> Self {
        self.default_model = Some(value.into());
        self
    }

    pub fn temperature(mut self, value: f32) -> Self {
        self.temperature = Some(value);
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = Some(value);
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, GrantSpiderError> {
        let base_url = self
            .base_url
            .ok_or_else(|| GrantSpiderError::InvalidConfig("base_url is required".into()))?;
        let default_model = self
            .default_model
            .filter(|model| !model.trim().is_empty())
            .ok_or_else(|| GrantSpiderError::InvalidConfig("default_model is required".into()))?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(60));
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GrantSpiderError::LlmProvider(err.to_string()))?;

        Ok(OpenAiCompatibleClient {
            http,
            endpoint: completions_endpoint(&base_url),
            api_key: self.api_key,
            default_model,
            temperature: self.temperature,
            timeout,
        })
    }
}

/// Accepts both `https://host` and `https://host/v1` style base URLs.
fn completions_endpoint(base_url: &Url) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/chat/completions")
    } else {
        format!("{base}/v1/chat/completions")
    }
}

#[async_trait::async_trait]
impl Llm for OpenAiCompatibleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, GrantSpiderError> {
        let LlmRequest {
            model,
            messages,
            temperature,
        } = input;
        let request = ChatCompletionRequest {
            model: if model.is_empty() {
                self.default_model.clone()
            } else {
                model
            },
            messages,
            temperature: temperature.or(self.temperature),
            stream: false,
        };

        tracing::debug!(endpoint = %self.endpoint, model = %request.model, "chat completion request");

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| transport_error(err, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            return Err(GrantSpiderError::LlmProvider(format!(
                "{status}: {message}"
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| transport_error(err, self.timeout))?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GrantSpiderError::LlmProvider("no choices returned".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
        })
    }
}
