use async_trait::async_trait;
use curator_core::{ChatMessage, ChatOptions, LLMProvider, LLMResponse, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::envelope::response_text;
use crate::retry::retry_with_delays;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Any endpoint speaking the OpenAI `chat/completions` dialect.
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    base_url: String,
    retry_delays: Vec<u64>,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating OpenAiCompatProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry_delays: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_retry_delays(mut self, retry_delays: Vec<u64>) -> Self {
        self.retry_delays = retry_delays;
        self
    }

    fn request_body(messages: &[ChatMessage], options: &ChatOptions) -> Value {
        let mut request = json!({
            "model": options.model,
            "messages": messages,
        });
        if let Some(temperature) = options.temperature {
            request["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            request["max_tokens"] = json!(max_tokens);
        }
        request
    }

    async fn try_send(&self, request: &Value) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let content = response_text(&response)?;
        let usage = response["usage"].as_object().map(|u| Usage {
            prompt_tokens: u32::try_from(u["prompt_tokens"].as_u64().unwrap_or(0)).unwrap_or(0),
            completion_tokens: u32::try_from(u["completion_tokens"].as_u64().unwrap_or(0))
                .unwrap_or(0),
            total_tokens: u32::try_from(u["total_tokens"].as_u64().unwrap_or(0)).unwrap_or(0),
        });

        Ok(LLMResponse { content, usage })
    }
}

#[async_trait]
impl LLMProvider for OpenAiCompatProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> anyhow::Result<LLMResponse> {
        let request = Self::request_body(messages, options);

        info!("Sending request to {}: model={}", self.base_url, options.model);
        let response =
            retry_with_delays(|| self.try_send(&request), &self.retry_delays).await?;

        info!("Received chat completion");
        Ok(response)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
