//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `WAYMARK__*` 覆盖（双下划线表示嵌套，如 `WAYMARK__AGENT__MODE=llm`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::agent::{AgentMode, LlmConfig};
use crate::core::DEFAULT_EVENT_LOG_CAPACITY;
use crate::engine::DEFAULT_HIGHLIGHT_MS;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub engine: EngineSection,
    pub agent: AgentSection,
    pub bridge: BridgeSection,
    pub model: ModelSection,
    pub server: ServerSection,
}

/// [app] 段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [engine] 段：高亮时长、事件日志容量
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub highlight_duration_ms: u64,
    pub event_log_capacity: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            highlight_duration_ms: DEFAULT_HIGHLIGHT_MS,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

/// [agent] 段：模式选择与对话窗口
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// rule-based / llm / auto
    pub mode: AgentMode,
    pub force_rule_based: bool,
    /// 启动时的离线标记（运行中由宿主通过 ConnectivityFlag 切换）
    pub offline: bool,
    /// 发往远端的最近消息条数
    pub history_window: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            mode: AgentMode::Auto,
            force_rule_based: false,
            offline: false,
            history_window: 10,
        }
    }
}

/// [bridge] 段：远端 Agent 端点（POST /agent）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// 未设置时视为没有 LLM 配置
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl BridgeSection {
    pub fn llm_config(&self) -> Option<LlmConfig> {
        let endpoint = self.endpoint.as_ref().filter(|e| !e.trim().is_empty())?;
        Some(LlmConfig {
            endpoint: endpoint.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
        })
    }
}

/// [model] 段：服务端 RemoteAgent 使用的 OpenAI 兼容模型
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// openai / deepseek / none；none 表示服务端也只用规则解释器
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// [server] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 WAYMARK__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 WAYMARK__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("WAYMARK")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.engine.highlight_duration_ms, 2000);
        assert_eq!(cfg.engine.event_log_capacity, 50);
        assert_eq!(cfg.agent.mode, AgentMode::Auto);
        assert_eq!(cfg.agent.history_window, 10);
        assert!(cfg.bridge.llm_config().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[engine]
highlight_duration_ms = 750

[agent]
mode = "rule-based"

[bridge]
endpoint = "http://127.0.0.1:9000/agent"
timeout_secs = 5
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.engine.highlight_duration_ms, 750);
        assert_eq!(cfg.engine.event_log_capacity, 50);
        assert_eq!(cfg.agent.mode, AgentMode::RuleBased);
        let llm = cfg.bridge.llm_config().unwrap();
        assert_eq!(llm.endpoint, "http://127.0.0.1:9000/agent");
        assert_eq!(llm.timeout_secs, 5);
    }

    #[test]
    fn test_blank_endpoint_means_no_llm() {
        let bridge = BridgeSection {
            endpoint: Some("  ".into()),
            ..BridgeSection::default()
        };
        assert!(bridge.llm_config().is_none());
    }
}
