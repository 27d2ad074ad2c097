//! 工具层：注册表、内置工具目录、参数 Schema 与调用分发

pub mod builtin;
pub mod executor;
pub mod registry;
pub mod schema;

pub use builtin::catalog;
pub use executor::{dispatch_tool_call, DispatchOutcome};
pub use registry::{
    convert_tool_call, ToolCallConversion, ToolDefinition, ToolHandler, ToolRegistry,
    INSTRUCTION_TOOLS,
};
pub use schema::{parameters_for, ToolParameters};
