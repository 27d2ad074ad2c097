//! 核心层：错误类型、状态中心、上下文快照、会话、优雅关闭

pub mod error;
pub mod session;
pub mod shutdown;
pub mod snapshot;
pub mod state;

pub use error::{AgentError, DecodeError};
pub use session::Session;
pub use shutdown::{cancel_when, signal_token, wait_for_signal};
pub use snapshot::describe;
pub use state::{Event, StateStore, StoreChange, DEFAULT_EVENT_LOG_CAPACITY};
