//! 线上协议：Marker / Context / Instruction / AgentRequest / AgentResponse
//!
//! 所有类型以 camelCase JSON 序列化，与前端宿主及远端 Agent 共享同一套形状。
//! 解码入口见 [`decode`]：唯一的边界解析器，拒绝无法识别的形状。

pub mod decode;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::memory::Message;

pub use decode::{decode_agent_response, decode_instruction, looks_like_instruction, LegacyToolCall};

/// 下拉 / 单选等控件的候选项
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerOption {
    pub label: String,
    pub value: String,
}

/// UI 中声明的可交互点（id + 人类可读标签 + 意图描述）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub label: String,
    pub intent: String,
    pub element_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<MarkerOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<Vec<String>>,
}

impl Marker {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        intent: impl Into<String>,
        element_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            intent: intent.into(),
            element_type: element_type.into(),
            value: None,
            options: None,
            selected_options: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: Vec<MarkerOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// 链接类元素：在视口内时导航意图优先点击
    pub fn is_link_like(&self) -> bool {
        matches!(
            self.element_type.to_lowercase().as_str(),
            "link" | "a" | "nav" | "tab" | "menuitem"
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

/// 错误来源：出错的界面区域与可重试的 Marker
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_id: Option<String>,
}

/// 宿主应用上报的错误，仅作为数据存储，供解释器做重试上下文
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: ErrorDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ErrorMeta>,
    pub timestamp: i64,
}

/// 发往远端前的消息截断长度（字符）
const SANITIZED_MESSAGE_MAX_CHARS: usize = 500;

impl ErrorReport {
    pub fn new(message: impl Into<String>, meta: Option<ErrorMeta>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
            },
            meta,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }

    pub fn marker_id(&self) -> Option<&str> {
        self.meta.as_ref().and_then(|m| m.marker_id.as_deref())
    }

    /// 只保留消息首行并截断，meta 与时间戳原样保留
    pub fn sanitized(&self) -> Self {
        let first_line = self.error.message.lines().next().unwrap_or("").trim();
        let message: String = first_line.chars().take(SANITIZED_MESSAGE_MAX_CHARS).collect();
        Self {
            error: ErrorDetail { message },
            meta: self.meta.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// 某一时刻的不可变快照：全部 Marker + 路由 / 状态 / 错误
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub markers: Vec<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_view_marker_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl Context {
    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn is_in_view(&self, id: &str) -> bool {
        self.in_view_marker_ids
            .as_ref()
            .is_some_and(|ids| ids.iter().any(|i| i == id))
    }

    /// 发往远端的副本：错误信息经过清洗
    pub fn sanitized(&self) -> Self {
        Self {
            error: self.error.as_ref().map(ErrorReport::sanitized),
            ..self.clone()
        }
    }
}

/// 执行引擎可执行的五种规范指令
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Instruction {
    Click { id: String },
    Navigate { route: String },
    Highlight { id: String },
    Scroll { id: String },
    FillInput { id: String, value: String },
}

impl Instruction {
    pub fn click(id: impl Into<String>) -> Self {
        Self::Click { id: id.into() }
    }

    pub fn navigate(route: impl Into<String>) -> Self {
        Self::Navigate {
            route: route.into(),
        }
    }

    pub fn highlight(id: impl Into<String>) -> Self {
        Self::Highlight { id: id.into() }
    }

    pub fn scroll(id: impl Into<String>) -> Self {
        Self::Scroll { id: id.into() }
    }

    pub fn fill_input(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FillInput {
            id: id.into(),
            value: value.into(),
        }
    }

    /// 线上 `action` 字段的取值，同时也是内置工具名
    pub fn action(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Navigate { .. } => "navigate",
            Self::Highlight { .. } => "highlight",
            Self::Scroll { .. } => "scroll",
            Self::FillInput { .. } => "fillInput",
        }
    }

    /// 目标 Marker id（navigate 没有）
    pub fn marker_id(&self) -> Option<&str> {
        match self {
            Self::Click { id }
            | Self::Highlight { id }
            | Self::Scroll { id }
            | Self::FillInput { id, .. } => Some(id),
            Self::Navigate { .. } => None,
        }
    }

    /// 转为同名内置工具调用，参数即指令去掉 action 后的字段
    pub fn to_tool_call(&self) -> RawToolCall {
        let mut arguments = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        arguments.remove("action");
        RawToolCall {
            name: self.action().to_string(),
            arguments: Value::Object(arguments),
        }
    }
}

/// 远端 Agent 的原始工具调用：arguments 可以是对象，也可以是 JSON 字符串（OpenAI 风格）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl RawToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// 取出参数对象；字符串形式先按 JSON 解析，空值视为空对象
    pub fn arguments_object(&self) -> Option<Map<String, Value>> {
        match &self.arguments {
            Value::Object(map) => Some(map.clone()),
            Value::Null => Some(Map::new()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Agent 回复：自然语言 + 可选指令序列
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<Instruction>>,
}

impl AgentResponse {
    /// 只有回复、没有指令
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            instructions: None,
        }
    }

    pub fn with_instruction(reply: impl Into<String>, instruction: Instruction) -> Self {
        Self {
            reply: reply.into(),
            instructions: Some(vec![instruction]),
        }
    }

    pub fn instructions(&self) -> &[Instruction] {
        self.instructions.as_deref().unwrap_or(&[])
    }
}

/// 发往远端 Agent 的请求体
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRequest {
    pub input: String,
    pub context: Context,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}
