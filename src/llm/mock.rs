//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 返回预设文本，并记录每次收到的消息。

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::Message;

#[derive(Debug, Default)]
pub struct MockLlmClient {
    reply: Option<String>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    /// 每次都返回同一段文本
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// 每次都返回错误
    pub fn failing() -> Self {
        Self::default()
    }

    /// 最近一次调用收到的消息
    pub fn last_messages(&self) -> Option<Vec<Message>> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        self.reply
            .clone()
            .ok_or_else(|| "mock llm: no reply configured".to_string())
    }
}
