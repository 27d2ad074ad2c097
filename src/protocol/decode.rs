//! 边界解码：远端回复与工具结果的唯一入口
//!
//! 规范形状是五种 `action` 指令；旧版工具调用联合体（`type` = click / navigate / highlight / fill）
//! 通过显式映射转换为规范指令。两者都不是时直接报 `UnrecognizedShape`，不做按字段猜测。

use serde::Deserialize;
use serde_json::Value;

use super::{AgentResponse, Instruction};
use crate::core::DecodeError;

/// 旧版工具调用：只有四种，目标字段名为 `markerId`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LegacyToolCall {
    Click {
        #[serde(rename = "markerId", alias = "id")]
        marker_id: String,
    },
    Navigate {
        route: String,
    },
    Highlight {
        #[serde(rename = "markerId", alias = "id")]
        marker_id: String,
    },
    Fill {
        #[serde(rename = "markerId", alias = "id")]
        marker_id: String,
        value: String,
    },
}

impl From<LegacyToolCall> for Instruction {
    fn from(call: LegacyToolCall) -> Self {
        match call {
            LegacyToolCall::Click { marker_id } => Instruction::Click { id: marker_id },
            LegacyToolCall::Navigate { route } => Instruction::Navigate { route },
            LegacyToolCall::Highlight { marker_id } => Instruction::Highlight { id: marker_id },
            LegacyToolCall::Fill { marker_id, value } => Instruction::FillInput {
                id: marker_id,
                value,
            },
        }
    }
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    reply: String,
    #[serde(default)]
    instructions: Option<Vec<Value>>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 解码单条指令：带 `action` 按规范形状，带 `type` 按旧版映射，否则拒绝
pub fn decode_instruction(value: &Value) -> Result<Instruction, DecodeError> {
    let Some(obj) = value.as_object() else {
        return Err(DecodeError::unrecognized(
            "instruction",
            format!("expected object, got {}", json_kind(value)),
        ));
    };

    if obj.contains_key("action") {
        serde_json::from_value::<Instruction>(value.clone())
            .map_err(|e| DecodeError::invalid("instruction", e))
    } else if obj.contains_key("type") {
        serde_json::from_value::<LegacyToolCall>(value.clone())
            .map(Instruction::from)
            .map_err(|e| DecodeError::invalid("legacy tool call", e))
    } else {
        Err(DecodeError::unrecognized(
            "instruction",
            "missing `action` or `type` field",
        ))
    }
}

/// 判断一个值是否「看起来像指令」（带 action / type 字段的对象）
pub fn looks_like_instruction(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("action") || obj.contains_key("type"))
}

/// 解码远端回复：必须有字符串 `reply`，`instructions` 可缺省，每项逐条解码
pub fn decode_agent_response(value: &Value) -> Result<AgentResponse, DecodeError> {
    if !value.is_object() {
        return Err(DecodeError::unrecognized(
            "agent response",
            format!("expected object, got {}", json_kind(value)),
        ));
    }

    let envelope: ResponseEnvelope = serde_json::from_value(value.clone())
        .map_err(|e| DecodeError::invalid("agent response", e))?;

    let instructions = envelope
        .instructions
        .map(|items| items.iter().map(decode_instruction).collect::<Result<Vec<_>, _>>())
        .transpose()?;

    Ok(AgentResponse {
        reply: envelope.reply,
        instructions,
    })
}
