use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use grantspider_core::{GrantSpiderError, Llm, LlmRequest, LlmResponse, Message};

use crate::transport_error;

#[derive(Clone, Debug)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: Client,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self, GrantSpiderError> {
        Self::with_timeout(base_url, model, Duration::from_secs(120))
    }

    pub fn with_timeout(
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, GrantSpiderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GrantSpiderError::LlmProvider(err.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            http,
            timeout,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[async_trait::async_trait]
impl Llm for OllamaClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, GrantSpiderError> {
        let LlmRequest {
            model,
            messages,
            temperature,
        } = input;
        let model = if model.is_empty() {
            self.model.clone()
        } else {
            model
        };
        let request = OllamaChatRequest {
            model,
            messages,
            stream: false,
            options: temperature.map(|temperature| OllamaOptions { temperature }),
        };

        let url = format!("{}/api/chat", self.base_url);
        let response: OllamaChatResponse = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| transport_error(err, self.timeout))?
            .error_for_status()
            .map_err(|err| GrantSpiderError::LlmProvider(err.to_string()))?
            .json()
            .await
            .map_err(|err| transport_error(err, self.timeout))?;

        Ok(LlmResponse {
            content: response.message.content,
        })
    }
}
