//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 DeepSeek、OpenAI、自建代理等。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::config::ModelSection;
use crate::llm::LlmClient;
use crate::memory::{Message, Role};

const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// OpenAI 兼容客户端：complete 时转 Message 为 API 格式并取首条 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: &str) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            usage: TokenUsage::default(),
        }
    }

    fn to_openai_messages(
        &self,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, String> {
        messages
            .iter()
            .map(|m| {
                let content = m.content.clone();
                let built = match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(content)
                        .build()
                        .map(ChatCompletionRequestMessage::System),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(content)
                        .build()
                        .map(ChatCompletionRequestMessage::User),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(content)
                        .build()
                        .map(ChatCompletionRequestMessage::Assistant),
                };
                built.map_err(|e| e.to_string())
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages)?)
            .build()
            .map_err(|e| e.to_string())?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| e.to_string())?;

        if let Some(usage) = &response.usage {
            self.usage
                .add(usage.prompt_tokens as u64, usage.completion_tokens as u64);
        }

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

/// 按 [model] 段创建客户端；provider = none 或缺少 API Key 时返回 None（服务端只用规则解释器）
pub fn create_llm_from_config(model: &ModelSection) -> Option<Arc<dyn LlmClient>> {
    let provider = model.provider.to_lowercase();
    let (env_key, default_base) = match provider.as_str() {
        "openai" => ("OPENAI_API_KEY", None),
        "deepseek" => ("DEEPSEEK_API_KEY", Some(DEEPSEEK_BASE_URL)),
        "none" | "" => return None,
        other => {
            tracing::warn!(provider = %other, "unknown model provider, using rule-based interpreter");
            return None;
        }
    };

    let Some(api_key) = model
        .api_key
        .clone()
        .or_else(|| std::env::var(env_key).ok())
    else {
        tracing::warn!(provider = %provider, "{} not set, using rule-based interpreter", env_key);
        return None;
    };

    let base_url = model.base_url.as_deref().or(default_base);
    tracing::info!(provider = %provider, model = %model.model, "Using remote model");
    Some(Arc::new(OpenAiClient::new(base_url, &model.model, &api_key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_none_has_no_client() {
        assert!(create_llm_from_config(&ModelSection::default()).is_none());
    }

    #[test]
    fn test_configured_key_builds_client() {
        let section = ModelSection {
            provider: "deepseek".into(),
            model: "deepseek-chat".into(),
            base_url: None,
            api_key: Some("sk-test".into()),
        };
        assert!(create_llm_from_config(&section).is_some());
    }

    #[test]
    fn test_token_usage_accumulates() {
        let client = OpenAiClient::new(None, "gpt-4o-mini", "sk-test");
        assert_eq!(client.token_usage(), (0, 0, 0));
        client.usage.add(120, 30);
        client.usage.add(80, 20);
        assert_eq!(client.token_usage(), (200, 50, 250));
    }

    #[test]
    fn test_message_conversion() {
        let client = OpenAiClient::new(None, "gpt-4o-mini", "sk-test");
        let converted = client
            .to_openai_messages(&[Message::system("s"), Message::user("u"), Message::assistant("a")])
            .unwrap();
        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[2], ChatCompletionRequestMessage::Assistant(_)));
    }
}
