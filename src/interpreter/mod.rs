//! 规则解释器：不依赖网络，把自由文本确定性地翻译为指令
//!
//! 处理顺序：重试（上下文带错误时）→ 关键词族（导航、点击、滚动、高亮、填写，先命中者胜）→ 帮助。
//! 对任意输入都返回非空 reply，不会失败。

pub mod fill;
pub mod matcher;
pub mod routes;

use crate::protocol::{AgentResponse, Context, Instruction, Marker};

use matcher::{detect_family, find_marker, is_retry_request, normalize, Family};

#[derive(Clone, Debug, Default)]
pub struct RuleBasedInterpreter;

impl RuleBasedInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn interpret(&self, input: &str, context: &Context) -> AgentResponse {
        let normalized = normalize(input);

        if let Some(response) = self.retry(&normalized, context) {
            return response;
        }

        let Some(hit) = detect_family(&normalized) else {
            return help_reply(context);
        };
        tracing::debug!(family = ?hit.family, search = %hit.search, "rule-based match");

        match hit.family {
            Family::Navigate => navigate(&hit.search, context),
            Family::Click => on_marker(&hit.search, context, "click", |m| {
                (format!("Clicking {}.", m.label), Instruction::click(&m.id))
            }),
            Family::Scroll => on_marker(&hit.search, context, "scroll to", |m| {
                (format!("Scrolling to {}.", m.label), Instruction::scroll(&m.id))
            }),
            Family::Highlight => on_marker(&hit.search, context, "highlight", |m| {
                (format!("Highlighting {}.", m.label), Instruction::highlight(&m.id))
            }),
            Family::Fill => fill_reply(input, &hit.search, context),
        }
    }

    fn retry(&self, normalized: &str, context: &Context) -> Option<AgentResponse> {
        let error = context.error.as_ref()?;
        if !is_retry_request(normalized) {
            return None;
        }
        let target = error.marker_id().and_then(|id| context.marker(id));
        Some(match target {
            Some(marker) => AgentResponse::with_instruction(
                format!("Retrying {}.", marker.label),
                Instruction::click(&marker.id),
            ),
            None => AgentResponse::reply(format!(
                "The last action failed ({}), and there is no control I can retry for you.",
                error.message()
            )),
        })
    }
}

fn not_found(search: &str, verb: &str) -> AgentResponse {
    if search.is_empty() {
        AgentResponse::reply(format!("I couldn't find anything to {verb}."))
    } else {
        AgentResponse::reply(format!("I couldn't find \"{search}\" to {verb}."))
    }
}

fn on_marker(
    search: &str,
    context: &Context,
    verb: &str,
    build: impl FnOnce(&Marker) -> (String, Instruction),
) -> AgentResponse {
    match find_marker(&context.markers, search) {
        Some(marker) => {
            let (reply, instruction) = build(marker);
            AgentResponse::with_instruction(reply, instruction)
        }
        None => not_found(search, verb),
    }
}

fn navigate(search: &str, context: &Context) -> AgentResponse {
    if let Some(marker) = find_marker(&context.markers, search) {
        return if marker.is_link_like() && context.is_in_view(&marker.id) {
            AgentResponse::with_instruction(
                format!("Opening {}.", marker.label),
                Instruction::click(&marker.id),
            )
        } else {
            AgentResponse::with_instruction(
                format!("Scrolling to {}.", marker.label),
                Instruction::scroll(&marker.id),
            )
        };
    }

    let Some(route) = routes::resolve_route(search) else {
        return not_found(search, "navigate to");
    };
    if context.route.as_deref() == Some(route.as_str()) {
        return AgentResponse::reply(format!("You're already on {route}."));
    }
    AgentResponse::with_instruction(
        format!("Navigating to {route}..."),
        Instruction::navigate(route),
    )
}

fn fill_reply(original: &str, search: &str, context: &Context) -> AgentResponse {
    if let Some(target) = fill::extract(original, &context.markers) {
        return AgentResponse::with_instruction(
            format!("Filling {} with \"{}\".", target.marker.label, target.value),
            Instruction::fill_input(&target.marker.id, target.value),
        );
    }
    match find_marker(&context.markers, search) {
        Some(marker) => AgentResponse::reply(format!(
            "What should I enter into {}? Try \"fill {} with <value>\".",
            marker.label,
            marker.label.to_lowercase()
        )),
        None => not_found(search, "fill"),
    }
}

fn help_reply(context: &Context) -> AgentResponse {
    let mut reply = String::from(
        "I can navigate, click, scroll, highlight or fill fields. \
         Try \"go to billing\" or \"fill email with you@example.com\".",
    );
    if context.markers.is_empty() {
        reply.push_str(" There are no interactive elements on screen right now.");
    } else {
        let available = context
            .markers
            .iter()
            .map(|m| format!("{} ({})", m.label, m.id))
            .collect::<Vec<_>>()
            .join(", ");
        reply.push_str(&format!(" Available: {available}."));
    }
    AgentResponse::reply(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorMeta, ErrorReport};
    use crate::tools::{convert_tool_call, ToolCallConversion};

    fn context() -> Context {
        Context {
            markers: vec![
                Marker::new("nav_settings", "Settings", "open account settings", "link"),
                Marker::new("connect_stripe", "Connect Stripe", "connect payment provider", "button"),
                Marker::new("email", "Email", "account email address", "input"),
                Marker::new("faq", "FAQ", "frequently asked questions", "section"),
            ],
            in_view_marker_ids: Some(vec!["nav_settings".into(), "email".into()]),
            route: Some("/".into()),
            ..Context::default()
        }
    }

    fn interpret(input: &str, ctx: &Context) -> AgentResponse {
        RuleBasedInterpreter::new().interpret(input, ctx)
    }

    #[test]
    fn test_navigate_by_route_table() {
        let r = interpret("go to billing", &context());
        assert_eq!(r.reply, "Navigating to /billing...");
        assert_eq!(r.instructions, Some(vec![Instruction::navigate("/billing")]));
    }

    #[test]
    fn test_already_on_route() {
        let ctx = Context {
            route: Some("/billing".into()),
            ..context()
        };
        let r = interpret("go to billing", &ctx);
        assert_eq!(r.reply, "You're already on /billing.");
        assert!(r.instructions.is_none());
    }

    #[test]
    fn test_retry_clicks_error_marker() {
        let ctx = Context {
            error: Some(ErrorReport::new(
                "Stripe connection timed out",
                Some(ErrorMeta {
                    surface: Some("integrations".into()),
                    marker_id: Some("connect_stripe".into()),
                }),
            )),
            ..context()
        };
        let r = interpret("retry", &ctx);
        assert_eq!(r.instructions, Some(vec![Instruction::click("connect_stripe")]));
        assert!(!r.reply.is_empty());
    }

    #[test]
    fn test_retry_without_marker_explains() {
        let ctx = Context {
            error: Some(ErrorReport::new("boom", None)),
            ..context()
        };
        let r = interpret("please try again", &ctx);
        assert!(r.instructions.is_none());
        assert!(r.reply.contains("boom"));
    }

    #[test]
    fn test_retry_ignored_without_error() {
        let r = interpret("retry", &context());
        assert!(r.instructions.is_none());
        assert!(r.reply.starts_with("I can navigate"));
    }

    #[test]
    fn test_navigate_link_in_view_clicks() {
        let r = interpret("open settings", &context());
        assert_eq!(r.instructions, Some(vec![Instruction::click("nav_settings")]));
    }

    #[test]
    fn test_navigate_marker_out_of_view_scrolls() {
        let mut ctx = context();
        ctx.in_view_marker_ids = Some(vec![]);
        let r = interpret("take me to settings", &ctx);
        assert_eq!(r.instructions, Some(vec![Instruction::scroll("nav_settings")]));

        // 非链接类元素即使在视口内也滚动
        let r = interpret("go to the faq section", &context());
        assert_eq!(r.instructions, Some(vec![Instruction::scroll("faq")]));
    }

    #[test]
    fn test_navigate_explicit_path() {
        let r = interpret("navigate to /reports", &context());
        assert_eq!(r.instructions, Some(vec![Instruction::navigate("/reports")]));
    }

    #[test]
    fn test_navigate_unknown_target() {
        let r = interpret("go to narnia", &context());
        assert!(r.instructions.is_none());
        assert!(r.reply.starts_with("I couldn't find"));
    }

    #[test]
    fn test_click_scroll_highlight() {
        let ctx = context();
        let r = interpret("Click the Connect Stripe button", &ctx);
        assert_eq!(r.instructions, Some(vec![Instruction::click("connect_stripe")]));

        let r = interpret("scroll to faq", &ctx);
        assert_eq!(r.instructions, Some(vec![Instruction::scroll("faq")]));

        let r = interpret("highlight email", &ctx);
        assert_eq!(r.instructions, Some(vec![Instruction::highlight("email")]));

        let r = interpret("press the launch button", &ctx);
        assert!(r.instructions.is_none());
        assert_eq!(r.reply, "I couldn't find \"launch\" to click.");
    }

    #[test]
    fn test_fill_keeps_value_case() {
        let r = interpret("Fill the email field with Jane@Example.com", &context());
        assert_eq!(
            r.instructions,
            Some(vec![Instruction::fill_input("email", "Jane@Example.com")])
        );
    }

    #[test]
    fn test_fill_without_value_asks() {
        let r = interpret("fill in the email field", &context());
        assert!(r.instructions.is_none());
        assert!(r.reply.starts_with("What should I enter into Email?"));
    }

    #[test]
    fn test_help_lists_markers() {
        let r = interpret("hello?", &context());
        assert!(r.instructions.is_none());
        assert!(r.reply.contains("Connect Stripe (connect_stripe)"));

        let r = interpret("", &Context::default());
        assert!(r.instructions.is_none());
        assert!(!r.reply.is_empty());
    }

    #[test]
    fn test_instructions_round_trip_through_tool_conversion() {
        let ctx = context();
        let inputs = [
            "go to billing",
            "open settings",
            "click connect stripe",
            "scroll to faq",
            "highlight email",
            "enter a@b.com into the email field",
        ];
        for input in inputs {
            let response = interpret(input, &ctx);
            assert!(!response.instructions().is_empty(), "no instruction for {input}");
            for instruction in response.instructions() {
                assert_eq!(
                    convert_tool_call(&instruction.to_tool_call()),
                    ToolCallConversion::Instruction(instruction.clone()),
                );
            }
        }
    }
}
