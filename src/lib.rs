//! Waymark - Marker 驱动的 UI 智能体编排
//!
//! 模块划分：
//! - **agent**: 模式选择（规则 / 远端 / 自动）、远端桥接与服务端 RemoteAgent
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 状态中心、上下文快照、会话、错误类型、优雅关闭
//! - **engine**: 指令执行引擎与高亮还原计时
//! - **interpreter**: 规则解释器（自由文本 → 指令）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **markers**: Marker 注册表与元素抽象
//! - **memory**: 对话历史
//! - **protocol**: 线上协议与边界解码
//! - **tools**: 工具注册表、内置工具与调用分发
//! - **server**: HTTP 端点（feature `server`）

pub mod agent;
pub mod config;
pub mod core;
pub mod engine;
pub mod interpreter;
pub mod llm;
pub mod markers;
pub mod memory;
pub mod observability;
pub mod protocol;
#[cfg(feature = "server")]
pub mod server;
pub mod tools;

pub use crate::agent::{AgentAdapter, AgentMode};
pub use crate::core::Session;
pub use crate::protocol::{AgentResponse, Context, Instruction, Marker};
