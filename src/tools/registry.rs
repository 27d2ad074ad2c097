//! 工具注册表
//!
//! 名称 → (Schema 描述, 执行器)。同一份目录既暴露给远端 Agent（tool_definitions），
//! 也用于把远端工具调用还原为规范指令（convert_tool_call）。
//! 重复注册与调用未注册工具属于配置期错误，直接返回给调用方。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AgentError, Session};
use crate::protocol::{Instruction, RawToolCall};
use crate::tools::schema::ToolParameters;

/// 五个可直接还原为指令的内置工具名
pub const INSTRUCTION_TOOLS: [&str; 5] = ["navigate", "click", "highlight", "scroll", "fillInput"];

/// 工具描述（供远端 Agent 理解功能与参数）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// 工具执行器：同步执行，直接作用于会话
pub trait ToolHandler: Send + Sync {
    fn call(&self, args: &Value, session: &mut Session) -> Result<Value, String>;
}

impl<F> ToolHandler for F
where
    F: Fn(&Value, &mut Session) -> Result<Value, String> + Send + Sync,
{
    fn call(&self, args: &Value, session: &mut Session) -> Result<Value, String> {
        self(args, session)
    }
}

/// 远端工具调用的转换结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolCallConversion {
    Instruction(Instruction),
    /// 不是内置指令工具（或参数不完整），由调用方直接执行
    Unrecognized,
}

struct RegisteredTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

/// 工具注册表：按注册顺序保存
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.definition.name == name)
    }

    pub(crate) fn insert(&mut self, definition: ToolDefinition, handler: Arc<dyn ToolHandler>) {
        self.tools.push(RegisteredTool {
            definition,
            handler,
        });
    }

    /// 注册工具；同名已存在时返回 DuplicateToolRegistration
    pub fn register(
        &mut self,
        definition: ToolDefinition,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), AgentError> {
        if self.position(&definition.name).is_some() {
            return Err(AgentError::DuplicateToolRegistration(definition.name));
        }
        self.insert(definition, Arc::new(handler));
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.tools.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools
            .iter()
            .find(|t| t.definition.name == name)
            .map(|t| &t.definition)
    }

    /// 完整 Schema 列表，用于暴露给远端 Agent
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.definition.name.clone()).collect()
    }

    /// Schema 列表的 JSON 文本，可拼入 system prompt
    pub fn to_schema_json(&self) -> String {
        serde_json::to_string_pretty(&self.tool_definitions()).unwrap_or_else(|_| "[]".to_string())
    }

    /// 调用执行器；未注册时返回 ToolNotRegistered，执行器拒绝参数时返回 ToolExecutionFailed
    pub fn execute_tool_call(
        &self,
        name: &str,
        args: &Value,
        session: &mut Session,
    ) -> Result<Value, AgentError> {
        let handler = self
            .tools
            .iter()
            .find(|t| t.definition.name == name)
            .map(|t| Arc::clone(&t.handler))
            .ok_or_else(|| AgentError::ToolNotRegistered(name.to_string()))?;
        handler
            .call(args, session)
            .map_err(AgentError::ToolExecutionFailed)
    }

    pub fn convert_tool_call(&self, call: &RawToolCall) -> ToolCallConversion {
        convert_tool_call(call)
    }
}

/// 内置指令工具名 → Instruction；其他名称或参数不完整返回 Unrecognized
pub fn convert_tool_call(call: &RawToolCall) -> ToolCallConversion {
    if !INSTRUCTION_TOOLS.contains(&call.name.as_str()) {
        return ToolCallConversion::Unrecognized;
    }
    let Some(mut args) = call.arguments_object() else {
        tracing::warn!(tool = %call.name, "tool call arguments are not an object");
        return ToolCallConversion::Unrecognized;
    };
    args.insert("action".to_string(), Value::String(call.name.clone()));
    match serde_json::from_value::<Instruction>(Value::Object(args)) {
        Ok(instruction) => ToolCallConversion::Instruction(instruction),
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "incomplete tool call arguments");
            ToolCallConversion::Unrecognized
        }
    }
}

/// 执行器参数统一为对象（空值视为空对象）
pub(crate) fn args_object(call: &RawToolCall) -> Result<Value, AgentError> {
    call.arguments_object()
        .map(Value::Object)
        .ok_or_else(|| {
            AgentError::ToolExecutionFailed(format!(
                "{}: arguments must be a JSON object",
                call.name
            ))
        })
}
