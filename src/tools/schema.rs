//! 工具参数 Schema：由参数结构体经 schemars 派生，展平为 `{type: "object", properties, required?}`
//!
//! 内置工具的参数结构体同时用于执行时的 serde 解析，保证暴露给远端的 Schema 与实际解析一致。

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 暴露给远端 Agent 的参数描述
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ToolParameters {
    /// 无参数
    pub fn empty() -> Self {
        Self {
            kind: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }
}

/// 从参数结构体生成 ToolParameters（子 Schema 内联，不产生 $ref）
pub fn parameters_for<T: JsonSchema>() -> ToolParameters {
    let root = SchemaSettings::draft07()
        .with(|s| s.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<T>();
    let value = serde_json::to_value(&root.schema).unwrap_or(Value::Null);

    let properties = value
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let required = value
        .get("required")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    ToolParameters {
        kind: "object".to_string(),
        properties,
        required,
    }
}

/// 目标 Marker
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MarkerArgs {
    /// Marker id，取自 describe 返回的 markers[].id
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FillInputArgs {
    /// 输入框或包含输入框的容器的 Marker id
    pub id: String,
    /// 要写入的值
    pub value: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NavigateArgs {
    /// 目标路由，如 /billing
    pub route: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HighlightArgs {
    /// Marker id
    pub id: String,
    /// 高亮持续毫秒数；0 表示只滚动不强调
    #[serde(default)]
    pub duration: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetStateArgs {
    /// 新的完整状态对象（整体替换）
    pub state: Map<String, Value>,
}
