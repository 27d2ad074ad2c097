//! Agent 适配层：每次请求在规则解释器与远端桥接之间选择
//!
//! - `rule-based` 或 force_rule_based：只用规则解释器
//! - `llm`：走桥接（桥接内部失败回退）；没有桥接配置时警告并降级
//! - `auto`（默认）：离线时用规则解释器，否则尝试桥接，失败回退
//!
//! `run` 不会失败，总是返回带非空 reply 的响应（远端回复除外，远端内容原样信任）。

pub mod bridge;
pub mod connectivity;
pub mod remote;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::core::AgentError;
use crate::interpreter::RuleBasedInterpreter;
use crate::memory::Message;
use crate::protocol::{AgentResponse, Context};

pub use bridge::{AgentTransport, HttpTransport, LlmBridge, LlmConfig, DEFAULT_HISTORY_WINDOW};
pub use connectivity::ConnectivityFlag;
pub use remote::RemoteAgent;

/// 解释模式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentMode {
    RuleBased,
    Llm,
    #[default]
    Auto,
}

pub struct AgentAdapter {
    mode: AgentMode,
    force_rule_based: bool,
    bridge: Option<LlmBridge>,
    interpreter: RuleBasedInterpreter,
    connectivity: ConnectivityFlag,
}

impl AgentAdapter {
    pub fn new(mode: AgentMode) -> Self {
        Self {
            mode,
            force_rule_based: false,
            bridge: None,
            interpreter: RuleBasedInterpreter::new(),
            connectivity: ConnectivityFlag::default(),
        }
    }

    /// 按配置构建：有 bridge.endpoint 时创建 HTTP 桥接
    pub fn from_config(cfg: &AppConfig) -> Result<Self, AgentError> {
        let mut adapter = Self::new(cfg.agent.mode)
            .with_force_rule_based(cfg.agent.force_rule_based)
            .with_connectivity(ConnectivityFlag::new(cfg.agent.offline));
        if let Some(llm) = cfg.bridge.llm_config() {
            let bridge = LlmBridge::from_config(llm)?.with_history_window(cfg.agent.history_window);
            adapter = adapter.with_bridge(bridge);
        }
        Ok(adapter)
    }

    pub fn with_bridge(mut self, bridge: LlmBridge) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn with_force_rule_based(mut self, force: bool) -> Self {
        self.force_rule_based = force;
        self
    }

    pub fn with_connectivity(mut self, flag: ConnectivityFlag) -> Self {
        self.connectivity = flag;
        self
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AgentMode) {
        self.mode = mode;
    }

    pub fn has_bridge(&self) -> bool {
        self.bridge.is_some()
    }

    /// 宿主持有的离线标记（克隆共享同一状态）
    pub fn connectivity(&self) -> ConnectivityFlag {
        self.connectivity.clone()
    }

    pub async fn run(&self, input: &str, context: &Context, messages: &[Message]) -> AgentResponse {
        if self.force_rule_based || self.mode == AgentMode::RuleBased {
            return self.interpreter.interpret(input, context);
        }

        match self.mode {
            AgentMode::Llm => match &self.bridge {
                Some(bridge) => bridge.run(input, context, messages).await,
                None => {
                    tracing::warn!("llm mode requested without bridge configuration, using rule-based interpreter");
                    self.interpreter.interpret(input, context)
                }
            },
            _ => {
                if self.connectivity.is_offline() {
                    tracing::debug!("offline, using rule-based interpreter");
                    return self.interpreter.interpret(input, context);
                }
                let Some(bridge) = &self.bridge else {
                    return self.interpreter.interpret(input, context);
                };
                match bridge.try_run(input, context, messages).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::warn!(error = %e, "remote agent failed, falling back to rule-based interpreter");
                        self.interpreter.interpret(input, context)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::agent::bridge::tests::MockTransport;
    use crate::protocol::Instruction;

    fn ctx() -> Context {
        Context {
            route: Some("/".into()),
            ..Context::default()
        }
    }

    fn remote_reply() -> serde_json::Value {
        json!({"reply": "from remote", "instructions": [{"action": "navigate", "route": "/help"}]})
    }

    #[test]
    fn test_mode_serde() {
        assert_eq!(serde_json::to_value(AgentMode::RuleBased).unwrap(), json!("rule-based"));
        let mode: AgentMode = serde_json::from_value(json!("llm")).unwrap();
        assert_eq!(mode, AgentMode::Llm);
        assert_eq!(AgentMode::default(), AgentMode::Auto);
    }

    #[tokio::test]
    async fn test_rule_based_never_calls_bridge() {
        let transport = MockTransport::ok(remote_reply());
        let adapter = AgentAdapter::new(AgentMode::RuleBased).with_bridge(LlmBridge::new(transport.clone()));
        let r = adapter.run("go to billing", &ctx(), &[]).await;
        assert_eq!(r.reply, "Navigating to /billing...");
        assert_eq!(transport.calls(), 0);

        let forced = AgentAdapter::new(AgentMode::Llm)
            .with_force_rule_based(true)
            .with_bridge(LlmBridge::new(transport.clone()));
        forced.run("go to billing", &ctx(), &[]).await;
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_mode_without_bridge_downgrades() {
        let adapter = AgentAdapter::new(AgentMode::Llm);
        let r = adapter.run("go to billing", &ctx(), &[]).await;
        assert_eq!(r.instructions(), &[Instruction::navigate("/billing")]);
    }

    #[tokio::test]
    async fn test_llm_mode_uses_bridge() {
        let transport = MockTransport::ok(remote_reply());
        let adapter = AgentAdapter::new(AgentMode::Llm).with_bridge(LlmBridge::new(transport.clone()));
        let r = adapter.run("anything", &ctx(), &[]).await;
        assert_eq!(r.reply, "from remote");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_auto_offline_skips_bridge() {
        let transport = MockTransport::ok(remote_reply());
        let adapter = AgentAdapter::new(AgentMode::Auto).with_bridge(LlmBridge::new(transport.clone()));
        adapter.connectivity().set_offline(true);
        let r = adapter.run("go to billing", &ctx(), &[]).await;
        assert_eq!(r.reply, "Navigating to /billing...");
        assert_eq!(transport.calls(), 0);

        adapter.connectivity().set_offline(false);
        let r = adapter.run("go to billing", &ctx(), &[]).await;
        assert_eq!(r.reply, "from remote");
    }

    #[tokio::test]
    async fn test_auto_failure_falls_back() {
        let transport = MockTransport::failing("timeout");
        let adapter = AgentAdapter::new(AgentMode::Auto).with_bridge(LlmBridge::new(transport.clone()));
        let r = adapter.run("go to billing", &ctx(), &[]).await;
        assert_eq!(r.instructions(), &[Instruction::navigate("/billing")]);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_auto_without_llm_always_replies() {
        let adapter = AgentAdapter::new(AgentMode::Auto);
        for input in ["", "???", "go to billing", "retry", "fill", "click"] {
            let r = adapter.run(input, &Context::default(), &[]).await;
            assert!(!r.reply.is_empty(), "empty reply for {input:?}");
        }
    }

    #[test]
    fn test_from_config_builds_bridge() {
        let mut cfg = AppConfig::default();
        assert!(!AgentAdapter::from_config(&cfg).unwrap().has_bridge());
        cfg.bridge.endpoint = Some("http://127.0.0.1:9/agent".into());
        cfg.agent.offline = true;
        let adapter = AgentAdapter::from_config(&cfg).unwrap();
        assert!(adapter.has_bridge());
        assert!(adapter.connectivity().is_offline());
    }
}
