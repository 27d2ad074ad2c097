//! 错误类型
//!
//! 只有配置期误用（重复注册工具、调用未注册工具）与远端桥接失败会以 `AgentError` 形式返回；
//! 目标 Marker 缺失、目标不可编辑等运行期情况由执行引擎以 `ActOutcome` 数据表达，不会抛出。

use thiserror::Error;

/// 编排层错误：工具注册表误用、远端调用失败、解码失败、配置错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Tool not registered: {0}")]
    ToolNotRegistered(String),

    #[error("Tool already registered: {0}")]
    DuplicateToolRegistration(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    /// 远端 Agent 的传输层或 HTTP 状态失败，由 Bridge 捕获后回退到规则解释器
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

/// 边界解码错误：拒绝无法识别的指令 / 响应形状
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unrecognized {kind} shape: {detail}")]
    UnrecognizedShape { kind: &'static str, detail: String },

    #[error("invalid {kind} payload: {source}")]
    Invalid {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    pub fn unrecognized(kind: &'static str, detail: impl Into<String>) -> Self {
        Self::UnrecognizedShape {
            kind,
            detail: detail.into(),
        }
    }

    pub fn invalid(kind: &'static str, source: serde_json::Error) -> Self {
        Self::Invalid { kind, source }
    }
}
