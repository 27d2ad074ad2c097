//! 远端 Agent 桥接
//!
//! 把 Context（错误已清洗）与最近 N 条对话序列化为一次 POST，请求体与回复形状见 protocol。
//! 传输失败或非 2xx 记为 NetworkFailure，回复结构不对记为 Decode；`run` 在两种情况下都回退到规则解释器。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{AgentError, DecodeError};
use crate::interpreter::RuleBasedInterpreter;
use crate::memory::{recent, Message};
use crate::protocol::{decode_agent_response, AgentRequest, AgentResponse, Context};

/// 默认发送的最近消息条数
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// 远端端点配置
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// 传输层：发送请求，返回未经解码的 JSON 回复
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn send(&self, request: &AgentRequest) -> Result<Value, AgentError>;
}

/// HTTP 传输（reqwest），可选 Bearer Token
pub struct HttpTransport {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpTransport {
    pub fn new(config: LlmConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::ConfigError(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn send(&self, request: &AgentRequest) -> Result<Value, AgentError> {
        let mut req = self.client.post(&self.config.endpoint).json(request);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| AgentError::NetworkFailure(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::NetworkFailure(format!(
                "agent endpoint returned HTTP {status}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AgentError::NetworkFailure(e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| AgentError::Decode(DecodeError::invalid("agent response", e)))
    }
}

/// 远端桥接：失败时回退到规则解释器
pub struct LlmBridge {
    transport: Arc<dyn AgentTransport>,
    interpreter: RuleBasedInterpreter,
    history_window: usize,
}

impl LlmBridge {
    pub fn new(transport: Arc<dyn AgentTransport>) -> Self {
        Self {
            transport,
            interpreter: RuleBasedInterpreter::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn from_config(config: LlmConfig) -> Result<Self, AgentError> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    pub fn build_request(&self, input: &str, context: &Context, messages: &[Message]) -> AgentRequest {
        AgentRequest {
            input: input.to_string(),
            context: context.sanitized(),
            messages: Some(recent(messages, self.history_window).to_vec()),
        }
    }

    /// 一次远端调用；错误原样返回
    pub async fn try_run(
        &self,
        input: &str,
        context: &Context,
        messages: &[Message],
    ) -> Result<AgentResponse, AgentError> {
        let request = self.build_request(input, context, messages);
        let value = self.transport.send(&request).await?;
        Ok(decode_agent_response(&value)?)
    }

    /// 远端调用，失败时记录警告并交给规则解释器
    pub async fn run(&self, input: &str, context: &Context, messages: &[Message]) -> AgentResponse {
        match self.try_run(input, context, messages).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "remote agent failed, falling back to rule-based interpreter");
                self.interpreter.interpret(input, context)
            }
        }
    }
}
