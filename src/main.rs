//! Waymark 演示入口
//!
//! 在无界面元素上挂载一个示例页面（导航链接、Connect Stripe 按钮、含邮箱输入框的表单），
//! 从标准输入逐行读取指令：describe → Agent → 执行，并打印回复与记录的事件。
//!
//! 启动: cargo run -- [config.toml]
//! 特殊命令: :describe  :offline  :online  :events  :fail  :quit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use tokio::io::{AsyncBufReadExt, BufReader};

use waymark::agent::AgentAdapter;
use waymark::config::load_config;
use waymark::markers::{HeadlessElement, UiElement};
use waymark::memory::{ConversationMemory, Message};
use waymark::protocol::{ErrorMeta, Marker};
use waymark::Session;

/// 示例页面的元素句柄；Session 只保存弱引用，页面存活期间必须持有
struct DemoPage {
    _elements: Vec<Arc<dyn UiElement>>,
}

fn mount(
    session: &mut Session,
    elements: &mut Vec<Arc<dyn UiElement>>,
    marker: Marker,
    element: Arc<dyn UiElement>,
) {
    session.mount(marker, &element);
    elements.push(element);
}

fn mount_demo_page(session: &mut Session) -> DemoPage {
    let mut elements: Vec<Arc<dyn UiElement>> = Vec::new();

    mount(
        session,
        &mut elements,
        Marker::new("nav_billing", "Billing", "open billing and invoices", "link"),
        HeadlessElement::link().build(),
    );
    mount(
        session,
        &mut elements,
        Marker::new("nav_settings", "Settings", "open account settings", "link"),
        HeadlessElement::link().build(),
    );
    mount(
        session,
        &mut elements,
        Marker::new("connect_stripe", "Connect Stripe", "connect the stripe payment provider", "button"),
        HeadlessElement::button().in_viewport(false).build(),
    );

    let email_input: Arc<dyn UiElement> = HeadlessElement::text_input().build();
    mount(
        session,
        &mut elements,
        Marker::new("account_form", "Email", "account email address", "form"),
        HeadlessElement::container().with_child(email_input.clone()).build(),
    );
    elements.push(email_input);

    DemoPage {
        _elements: elements,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    waymark::observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let mut session = Session::from_config(&cfg.engine)
        .with_navigate_hook(|route| tracing::info!(route = %route, "navigate"));
    let _page = mount_demo_page(&mut session);
    session.store_mut().set_route("/");

    let adapter = AgentAdapter::from_config(&cfg).context("Failed to create agent adapter")?;
    let connectivity = adapter.connectivity();
    let mut history = ConversationMemory::new(cfg.agent.history_window.max(1) * 2);

    println!(
        "waymark demo ({:?} mode{}). Type a command, or :quit to exit.",
        adapter.mode(),
        if adapter.has_bridge() { ", remote bridge configured" } else { "" }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = line.trim();
        match input {
            "" => continue,
            ":quit" | ":exit" => break,
            ":describe" => {
                let ctx = session.describe();
                println!("{}", serde_json::to_string_pretty(&ctx)?);
                continue;
            }
            ":offline" | ":online" => {
                connectivity.set_offline(input == ":offline");
                println!("offline = {}", connectivity.is_offline());
                continue;
            }
            ":events" => {
                for event in session.store().events() {
                    println!("  {}", serde_json::to_string(event)?);
                }
                continue;
            }
            // 模拟宿主上报的错误，便于演示 "retry"
            ":fail" => {
                session.store_mut().report_error(
                    "Stripe connection timed out",
                    Some(ErrorMeta {
                        surface: Some("integrations".to_string()),
                        marker_id: Some("connect_stripe".to_string()),
                    }),
                );
                println!("reported an error on connect_stripe");
                continue;
            }
            _ => {}
        }

        let context = session.describe();
        let response = adapter.run(input, &context, history.messages()).await;
        println!("> {}", response.reply);

        let outcomes = session.apply(&response);
        for (instruction, outcome) in response.instructions().iter().zip(&outcomes) {
            println!("  {} {:?}", instruction.action(), outcome);
        }
        let applied = outcomes.iter().filter(|o| o.is_applied()).count();
        let events: Vec<_> = session.store().events().collect();
        for event in &events[events.len().saturating_sub(applied)..] {
            println!("  event {}", serde_json::to_string(event)?);
        }

        history.push(Message::user(input));
        history.push(Message::assistant(response.reply.clone()));
    }

    session.reset();
    Ok(())
}
