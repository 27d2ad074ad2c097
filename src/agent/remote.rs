//! 远端 Agent：桥接协议的服务端一侧
//!
//! 没有模型时直接运行规则解释器；有模型时把工具目录与回复格式写进 system prompt，
//! 模型输出的 JSON（可带代码块围栏）经边界解码器还原为 AgentResponse。

use std::sync::Arc;

use serde_json::Value;

use crate::core::{AgentError, DecodeError};
use crate::interpreter::RuleBasedInterpreter;
use crate::llm::LlmClient;
use crate::memory::{recent, Message};
use crate::protocol::{decode_agent_response, AgentRequest, AgentResponse};
use crate::tools::ToolRegistry;

use super::DEFAULT_HISTORY_WINDOW;

const RESPONSE_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{"reply": "<short message for the user>", "instructions": [<zero or more instructions>]}
Each instruction is one of:
{"action": "navigate", "route": "/path"}
{"action": "click", "id": "<marker id>"}
{"action": "highlight", "id": "<marker id>"}
{"action": "scroll", "id": "<marker id>"}
{"action": "fillInput", "id": "<marker id>", "value": "<text>"}
Only use marker ids that appear in the context."#;

pub struct RemoteAgent {
    llm: Option<Arc<dyn LlmClient>>,
    tools: ToolRegistry,
    interpreter: RuleBasedInterpreter,
    history_window: usize,
}

impl RemoteAgent {
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            llm,
            tools: ToolRegistry::with_builtin_tools(),
            interpreter: RuleBasedInterpreter::new(),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    pub fn has_model(&self) -> bool {
        self.llm.is_some()
    }

    /// 模型客户端的累计 token 统计；没有模型时为 None
    pub fn token_usage(&self) -> Option<(u64, u64, u64)> {
        self.llm.as_ref().map(|llm| llm.token_usage())
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You operate a web application on behalf of the user through declared UI markers.\n\
             Available tools:\n{}\n\n{}",
            self.tools.to_schema_json(),
            RESPONSE_FORMAT
        )
    }

    fn build_messages(&self, request: &AgentRequest) -> Result<Vec<Message>, AgentError> {
        let context_json = serde_json::to_string_pretty(&request.context)
            .map_err(|e| AgentError::LlmError(format!("serialize context: {e}")))?;
        let history = request.messages.as_deref().unwrap_or(&[]);

        let mut messages = vec![Message::system(self.system_prompt())];
        messages.extend_from_slice(recent(history, self.history_window));
        messages.push(Message::user(format!(
            "Context:\n{context_json}\n\nUser request: {}",
            request.input
        )));
        Ok(messages)
    }

    pub async fn respond(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let Some(llm) = &self.llm else {
            return Ok(self.interpreter.interpret(&request.input, &request.context));
        };

        let messages = self.build_messages(&request)?;
        let raw = llm.complete(&messages).await.map_err(AgentError::LlmError)?;
        tracing::debug!(chars = raw.len(), "model reply received");

        let value: Value = serde_json::from_str(extract_json(&raw))
            .map_err(|e| AgentError::Decode(DecodeError::invalid("agent response", e)))?;
        Ok(decode_agent_response(&value)?)
    }
}

/// 去掉 ```json 围栏；没有围栏时取第一个 `{` 到最后一个 `}`
pub fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
