//! 工具调用分发
//!
//! 远端（或宿主）给出的 RawToolCall 先尝试还原为规范指令交给执行引擎；
//! 还原不了的按名称调用注册表中的执行器。执行器返回值若本身是指令形状，经边界解码后同样交给执行引擎。
//! 每次分发输出结构化审计日志（JSON）。

use std::time::Instant;

use serde_json::Value;

use crate::core::{AgentError, Session};
use crate::engine::ActOutcome;
use crate::protocol::{decode_instruction, looks_like_instruction, Instruction, RawToolCall};
use crate::tools::registry::{args_object, convert_tool_call, ToolCallConversion, ToolRegistry};

/// 分发结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// 内置指令工具：直接由执行引擎应用
    Acted {
        instruction: Instruction,
        outcome: ActOutcome,
    },
    /// 注册表执行器的返回值；返回值是指令时附带其执行结果
    Executed {
        result: Value,
        follow_up: Option<(Instruction, ActOutcome)>,
    },
}

impl DispatchOutcome {
    /// 分发产生的指令（若有）是否被成功应用；纯数据工具视为成功
    pub fn is_applied(&self) -> bool {
        match self {
            DispatchOutcome::Acted { outcome, .. } => outcome.is_applied(),
            DispatchOutcome::Executed { follow_up, .. } => follow_up
                .as_ref()
                .map_or(true, |(_, outcome)| outcome.is_applied()),
        }
    }
}

/// 分发一次工具调用
pub fn dispatch_tool_call(
    registry: &ToolRegistry,
    session: &mut Session,
    call: &RawToolCall,
) -> Result<DispatchOutcome, AgentError> {
    let start = Instant::now();
    let result = dispatch_inner(registry, session, call);

    let (ok, outcome) = match &result {
        Ok(DispatchOutcome::Acted { outcome, .. }) => (true, outcome_label(outcome)),
        Ok(DispatchOutcome::Executed {
            follow_up: Some((_, outcome)),
            ..
        }) => (true, outcome_label(outcome)),
        Ok(DispatchOutcome::Executed { .. }) => (true, "ok"),
        Err(AgentError::ToolNotRegistered(_)) => (false, "not_registered"),
        Err(_) => (false, "error"),
    };
    let audit = serde_json::json!({
        "event": "tool_audit",
        "tool": call.name,
        "ok": ok,
        "outcome": outcome,
        "duration_ms": start.elapsed().as_millis() as u64,
        "args_preview": args_preview(&call.arguments),
    });
    tracing::info!(audit = %audit.to_string(), "tool");

    result
}

fn dispatch_inner(
    registry: &ToolRegistry,
    session: &mut Session,
    call: &RawToolCall,
) -> Result<DispatchOutcome, AgentError> {
    if let ToolCallConversion::Instruction(instruction) = convert_tool_call(call) {
        let outcome = match (&instruction, highlight_duration(call)) {
            (Instruction::Highlight { id }, Some(ms)) => session.highlight_for(id, ms),
            _ => session.act(&instruction),
        };
        return Ok(DispatchOutcome::Acted {
            instruction,
            outcome,
        });
    }

    let args = args_object(call)?;
    let result = registry.execute_tool_call(&call.name, &args, session)?;

    let follow_up = if looks_like_instruction(&result) {
        let instruction = decode_instruction(&result)?;
        let outcome = session.act(&instruction);
        Some((instruction, outcome))
    } else {
        None
    };

    Ok(DispatchOutcome::Executed { result, follow_up })
}

/// highlight 调用显式给出的 duration（毫秒）；未给出时用引擎默认时长
fn highlight_duration(call: &RawToolCall) -> Option<u64> {
    if call.name != "highlight" {
        return None;
    }
    call.arguments_object()?.get("duration")?.as_u64()
}

fn outcome_label(outcome: &ActOutcome) -> &'static str {
    match outcome {
        ActOutcome::Applied => "applied",
        ActOutcome::NotFound(_) => "not_found",
        ActOutcome::UnsupportedTarget(_) => "unsupported_target",
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
