use async_trait::async_trait;
use curator_core::{ChatMessage, ChatOptions, LLMProvider, LLMResponse};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use tracing::debug;

/// Replays recorded response texts in call order.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
        }
    }

    /// Responses not yet handed out.
    pub async fn remaining(&self) -> usize {
        self.responses.lock().await.len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        _messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> anyhow::Result<LLMResponse> {
        let content = self
            .responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("Recorded responses exhausted at model {}", options.model))?;
        debug!("Replaying {} bytes for {}", content.len(), options.model);
        Ok(LLMResponse {
            content,
            usage: None,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_errors() {
        let provider = ScriptedProvider::new(vec!["[1]".to_string(), "[2]".to_string()]);
        let options = ChatOptions::new("m");

        assert_eq!(provider.chat(&[], &options).await.unwrap().content, "[1]");
        assert_eq!(provider.remaining().await, 1);
        assert_eq!(provider.chat(&[], &options).await.unwrap().content, "[2]");
        assert!(provider.chat(&[], &options).await.is_err());
    }
}
