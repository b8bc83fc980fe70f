use async_trait::async_trait;
use curator_core::{ChatMessage, ChatOptions, LLMProvider, LLMResponse, Usage};
use reqwest::Client;
use serde_json::{Value, json};
use tracing::info;

use crate::envelope::response_text;
use crate::retry::retry_with_delays;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Generative Language `generateContent`.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    retry_delays: Vec<u64>,
}

impl GeminiProvider {
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
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

    /// Every message becomes one text part of a single content entry.
    fn request_body(messages: &[ChatMessage], options: &ChatOptions) -> Value {
        let parts: Vec<Value> = messages
            .iter()
            .map(|message| json!({ "text": message.content }))
            .collect();

        let mut generation_config = json!({});
        if let Some(temperature) = options.temperature {
            generation_config["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            generation_config["maxOutputTokens"] = json!(max_tokens);
        }

        json!({
            "contents": [{ "parts": parts }],
            "generationConfig": generation_config,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/{model}:generateContent?key={}",
            self.base_url, self.api_key
        )
    }

    async fn try_send(&self, model: &str, request: &Value) -> anyhow::Result<LLMResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        let content = response_text(&response)?;
        let usage = response["usageMetadata"].as_object().map(|u| Usage {
            prompt_tokens: u32::try_from(u["promptTokenCount"].as_u64().unwrap_or(0)).unwrap_or(0),
            completion_tokens: u32::try_from(u["candidatesTokenCount"].as_u64().unwrap_or(0))
                .unwrap_or(0),
            total_tokens: u32::try_from(u["totalTokenCount"].as_u64().unwrap_or(0)).unwrap_or(0),
        });

        Ok(LLMResponse { content, usage })
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> anyhow::Result<LLMResponse> {
        let request = Self::request_body(messages, options);

        info!("Sending request to Gemini API: model={}", options.model);
        let response = retry_with_delays(
            || self.try_send(&options.model, &request),
            &self.retry_delays,
        )
        .await?;

        info!("Received response from Gemini API");
        Ok(response)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
