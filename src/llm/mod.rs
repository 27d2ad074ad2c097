//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod mock;
#[cfg(feature = "server")]
pub mod openai;
pub mod traits;

pub use mock::MockLlmClient;
#[cfg(feature = "server")]
pub use openai::{create_llm_from_config, OpenAiClient, TokenUsage};
pub use traits::LlmClient;
