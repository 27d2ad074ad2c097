//! 记忆层：会话内对话历史

pub mod conversation;

pub use conversation::{recent, ConversationMemory, Message, Role};
