use async_trait::async_trait;
use curator_core::{ChatMessage, ChatOptions, LLMProvider, LLMResponse};
use std::collections::HashMap;
use std::sync::Arc;

/// Dispatches each call to the provider registered for its model name.
#[derive(Default, Clone)]
pub struct ProviderRouter {
    routes: HashMap<String, Arc<dyn LLMProvider>>,
    fallback: Option<Arc<dyn LLMProvider>>,
}

impl ProviderRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, model: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        self.routes.insert(model.into(), provider);
        self
    }

    /// Provider for models with no explicit route.
    #[must_use]
    pub fn with_fallback(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.fallback = Some(provider);
        self
    }

    #[must_use]
    pub fn provider_for(&self, model: &str) -> Option<&Arc<dyn LLMProvider>> {
        self.routes.get(model).or(self.fallback.as_ref())
    }
}

#[async_trait]
impl LLMProvider for ProviderRouter {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> anyhow::Result<LLMResponse> {
        let provider = self
            .provider_for(&options.model)
            .ok_or_else(|| anyhow::anyhow!("No provider configured for model {}", options.model))?;
        provider.chat(messages, options).await
    }

    fn name(&self) -> &str {
        "router"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedProvider;

    #[tokio::test]
    async fn routes_by_model_name() {
        let flash = Arc::new(ScriptedProvider::new(["flash says hi"]));
        let pro = Arc::new(ScriptedProvider::new(["pro says hi"]));
        let router = ProviderRouter::new()
            .route("flash", flash.clone())
            .route("pro", pro.clone());

        let messages = [ChatMessage::user("hello")];
        let reply = router.chat(&messages, &ChatOptions::new("pro")).await.unwrap();
        assert_eq!(reply.content, "pro says hi");
        assert_eq!(flash.remaining().await, 1);

        let err = router
            .chat(&messages, &ChatOptions::new("other"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("other"));
    }

    #[tokio::test]
    async fn fallback_catches_unrouted_models() {
        let router = ProviderRouter::new()
            .with_fallback(Arc::new(ScriptedProvider::new(["[1]"])));
        let reply = router
            .chat(&[ChatMessage::user("x")], &ChatOptions::new("anything"))
            .await
            .unwrap();
        assert_eq!(reply.content, "[1]");
    }
}
