//! 内置工具目录：describe、click、fillInput、navigate、scroll、highlight、setState、getState

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::core::Session;
use crate::engine::ActOutcome;
use crate::protocol::Instruction;
use crate::tools::registry::{ToolDefinition, ToolHandler, ToolRegistry};
use crate::tools::schema::{
    parameters_for, FillInputArgs, HighlightArgs, MarkerArgs, NavigateArgs, SetStateArgs,
    ToolParameters,
};

fn parse<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, String> {
    serde_json::from_value(args.clone()).map_err(|e| format!("{tool}: invalid arguments: {e}"))
}

fn outcome_json(outcome: &ActOutcome) -> Value {
    match outcome {
        ActOutcome::Applied => json!({ "applied": true }),
        ActOutcome::NotFound(id) => json!({ "applied": false, "reason": "not_found", "id": id }),
        ActOutcome::UnsupportedTarget(id) => {
            json!({ "applied": false, "reason": "unsupported_target", "id": id })
        }
    }
}

fn describe(_args: &Value, session: &mut Session) -> Result<Value, String> {
    serde_json::to_value(session.describe()).map_err(|e| e.to_string())
}

fn click(args: &Value, session: &mut Session) -> Result<Value, String> {
    let MarkerArgs { id } = parse("click", args)?;
    Ok(outcome_json(&session.act(&Instruction::Click { id })))
}

fn fill_input(args: &Value, session: &mut Session) -> Result<Value, String> {
    let FillInputArgs { id, value } = parse("fillInput", args)?;
    Ok(outcome_json(&session.act(&Instruction::FillInput { id, value })))
}

fn navigate(args: &Value, session: &mut Session) -> Result<Value, String> {
    let NavigateArgs { route } = parse("navigate", args)?;
    Ok(outcome_json(&session.act(&Instruction::Navigate { route })))
}

fn scroll(args: &Value, session: &mut Session) -> Result<Value, String> {
    let MarkerArgs { id } = parse("scroll", args)?;
    Ok(outcome_json(&session.act(&Instruction::Scroll { id })))
}

fn highlight(args: &Value, session: &mut Session) -> Result<Value, String> {
    let HighlightArgs { id, duration } = parse("highlight", args)?;
    let outcome = match duration {
        Some(ms) => session.highlight_for(&id, ms),
        None => session.act(&Instruction::Highlight { id }),
    };
    Ok(outcome_json(&outcome))
}

fn set_state(args: &Value, session: &mut Session) -> Result<Value, String> {
    let SetStateArgs { state } = parse("setState", args)?;
    session.store_mut().set_state(state);
    Ok(json!({ "ok": true }))
}

fn get_state(_args: &Value, session: &mut Session) -> Result<Value, String> {
    Ok(Value::Object(session.store().state().clone()))
}

fn entry(
    definition: ToolDefinition,
    handler: impl ToolHandler + 'static,
) -> (ToolDefinition, Arc<dyn ToolHandler>) {
    (definition, Arc::new(handler))
}

/// 固定目录（按暴露顺序）
pub fn catalog() -> Vec<(ToolDefinition, Arc<dyn ToolHandler>)> {
    vec![
        entry(
            ToolDefinition::new(
                "describe",
                "Return the current UI context: markers, in-view ids, route, state and last error.",
                ToolParameters::empty(),
            ),
            describe,
        ),
        entry(
            ToolDefinition::new(
                "click",
                "Activate the element behind a marker.",
                parameters_for::<MarkerArgs>(),
            ),
            click,
        ),
        entry(
            ToolDefinition::new(
                "fillInput",
                "Write a value into an input marker (or the first editable field inside it).",
                parameters_for::<FillInputArgs>(),
            ),
            fill_input,
        ),
        entry(
            ToolDefinition::new(
                "navigate",
                "Change the application route.",
                parameters_for::<NavigateArgs>(),
            ),
            navigate,
        ),
        entry(
            ToolDefinition::new(
                "scroll",
                "Scroll a marker into the center of the view.",
                parameters_for::<MarkerArgs>(),
            ),
            scroll,
        ),
        entry(
            ToolDefinition::new(
                "highlight",
                "Scroll a marker into view and briefly emphasize it.",
                parameters_for::<HighlightArgs>(),
            ),
            highlight,
        ),
        entry(
            ToolDefinition::new(
                "setState",
                "Replace the whole application state object.",
                parameters_for::<SetStateArgs>(),
            ),
            set_state,
        ),
        entry(
            ToolDefinition::new(
                "getState",
                "Read the application state object.",
                ToolParameters::empty(),
            ),
            get_state,
        ),
    ]
}

impl ToolRegistry {
    /// 预装内置目录的注册表
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        for (definition, handler) in catalog() {
            registry.insert(definition, handler);
        }
        registry
    }
}
