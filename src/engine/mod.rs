//! 指令执行引擎
//!
//! 把五种规范指令作用到宿主 UI 上。所有动作都是全函数：目标缺失或不可编辑只记 warn 日志并返回
//! [`ActOutcome`]，不会返回错误；每次成功的动作恰好追加一条事件。

pub mod highlight;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::core::state::StateStore;
use crate::markers::{first_editable_descendant, MarkerRegistry, ScrollAlign, UiElement, UiEvent};
use crate::protocol::Instruction;

pub use highlight::RevertTimers;

/// 高亮默认持续时间（毫秒）
pub const DEFAULT_HIGHLIGHT_MS: u64 = 2000;

/// 宿主提供的导航回调（如前端路由 push）
pub type NavigateHook = Box<dyn Fn(&str) + Send + Sync>;

/// 单条指令的执行结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActOutcome {
    Applied,
    /// 目标 Marker 不存在或元素已销毁
    NotFound(String),
    /// 目标不可编辑且没有可编辑的后代
    UnsupportedTarget(String),
}

impl ActOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActOutcome::Applied)
    }
}

pub struct InstructionEngine {
    highlight_duration: Duration,
    on_navigate: Option<NavigateHook>,
    reverts: RevertTimers,
}

impl Default for InstructionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHLIGHT_MS)
    }
}

impl InstructionEngine {
    pub fn new(highlight_duration_ms: u64) -> Self {
        Self {
            highlight_duration: Duration::from_millis(highlight_duration_ms),
            on_navigate: None,
            reverts: RevertTimers::new(),
        }
    }

    pub fn with_navigate_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_navigate = Some(Box::new(hook));
        self
    }

    pub fn set_navigate_hook(&mut self, hook: Option<NavigateHook>) {
        self.on_navigate = hook;
    }

    pub fn pending_reverts(&self) -> usize {
        self.reverts.pending()
    }

    /// 取消所有待执行的高亮还原（会话重置时调用）
    pub fn cancel_reverts(&mut self) {
        self.reverts.cancel_all();
    }

    pub fn act(
        &mut self,
        registry: &MarkerRegistry,
        store: &mut StateStore,
        instruction: &Instruction,
    ) -> ActOutcome {
        let outcome = match instruction {
            Instruction::Click { id } => self.click(registry, store, id),
            Instruction::Navigate { route } => self.navigate(store, route),
            Instruction::Highlight { id } => {
                let ms = self.highlight_duration.as_millis() as u64;
                self.highlight_for(registry, store, id, ms)
            }
            Instruction::Scroll { id } => self.scroll(registry, store, id),
            Instruction::FillInput { id, value } => self.fill_input(registry, store, id, value),
        };
        match &outcome {
            ActOutcome::Applied => {
                tracing::debug!(action = instruction.action(), "instruction applied")
            }
            ActOutcome::NotFound(id) => {
                tracing::warn!(action = instruction.action(), marker = %id, "marker not found, skipping")
            }
            ActOutcome::UnsupportedTarget(id) => {
                tracing::warn!(action = instruction.action(), marker = %id, "marker has no editable target, skipping")
            }
        }
        outcome
    }

    fn resolve(registry: &MarkerRegistry, id: &str) -> Result<Arc<dyn UiElement>, ActOutcome> {
        registry
            .resolve(id)
            .ok_or_else(|| ActOutcome::NotFound(id.to_string()))
    }

    /// 优先原生激活，避免重复触发上层事件处理；没有原生激活时才派发合成点击
    fn click(&mut self, registry: &MarkerRegistry, store: &mut StateStore, id: &str) -> ActOutcome {
        let el = match Self::resolve(registry, id) {
            Ok(el) => el,
            Err(outcome) => return outcome,
        };
        if !el.activate() {
            el.dispatch(UiEvent::PointerClick);
        }
        store.track("click", Some(json!({ "id": id })));
        ActOutcome::Applied
    }

    fn navigate(&mut self, store: &mut StateStore, route: &str) -> ActOutcome {
        store.set_route(route);
        if let Some(hook) = &self.on_navigate {
            hook(route);
        }
        store.track("navigate", Some(json!({ "route": route })));
        ActOutcome::Applied
    }

    /// 高亮：不在视口时先滚动到中央；duration 为 0 时不做视觉强调（由展示层负责），但仍滚动并记录事件
    pub fn highlight_for(
        &mut self,
        registry: &MarkerRegistry,
        store: &mut StateStore,
        id: &str,
        duration_ms: u64,
    ) -> ActOutcome {
        let el = match Self::resolve(registry, id) {
            Ok(el) => el,
            Err(outcome) => return outcome,
        };
        if !el.is_in_viewport() {
            el.scroll_into_view(ScrollAlign::Center);
        }
        if duration_ms > 0 {
            if self
                .reverts
                .schedule(id, &el, Duration::from_millis(duration_ms))
            {
                el.set_emphasis(true);
            } else {
                tracing::warn!(marker = %id, "no async runtime for highlight revert, skipping emphasis");
            }
        }
        store.track("highlight", Some(json!({ "id": id, "duration": duration_ms })));
        ActOutcome::Applied
    }

    fn scroll(&mut self, registry: &MarkerRegistry, store: &mut StateStore, id: &str) -> ActOutcome {
        let el = match Self::resolve(registry, id) {
            Ok(el) => el,
            Err(outcome) => return outcome,
        };
        el.scroll_into_view(ScrollAlign::Center);
        store.track("scroll", Some(json!({ "id": id })));
        ActOutcome::Applied
    }

    /// 填值：自身可编辑则直接写，否则找第一个可编辑后代；写入后依次派发 input、change（均冒泡）并聚焦
    fn fill_input(
        &mut self,
        registry: &MarkerRegistry,
        store: &mut StateStore,
        id: &str,
        value: &str,
    ) -> ActOutcome {
        let el = match Self::resolve(registry, id) {
            Ok(el) => el,
            Err(outcome) => return outcome,
        };
        let field = if el.kind().is_editable() {
            el
        } else {
            match first_editable_descendant(el.as_ref()) {
                Some(field) => field,
                None => return ActOutcome::UnsupportedTarget(id.to_string()),
            }
        };
        field.set_native_value(value);
        field.dispatch(UiEvent::Input { bubbles: true });
        field.dispatch(UiEvent::Change { bubbles: true });
        field.focus();
        store.track("fillInput", Some(json!({ "id": id })));
        ActOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::time::sleep;

    use super::*;
    use crate::markers::HeadlessElement;
    use crate::protocol::Marker;

    fn register(registry: &mut MarkerRegistry, id: &str, el: &Arc<HeadlessElement>) {
        let handle: Arc<dyn UiElement> = el.clone();
        registry.register(Marker::new(id, id, id, "button"), &handle);
    }

    fn single(id: &str, el: HeadlessElement) -> (InstructionEngine, MarkerRegistry, StateStore, Arc<HeadlessElement>) {
        let el = el.build();
        let mut registry = MarkerRegistry::new();
        register(&mut registry, id, &el);
        (InstructionEngine::default(), registry, StateStore::default(), el)
    }

    #[test]
    fn test_click_prefers_native_activation() {
        let (mut engine, registry, mut store, el) = single("save", HeadlessElement::button());
        let outcome = engine.act(&registry, &mut store, &Instruction::click("save"));
        assert_eq!(outcome, ActOutcome::Applied);
        assert_eq!(el.activations(), 1);
        assert!(el.events().is_empty());
        assert_eq!(store.last_event().unwrap().event_type, "click");
    }

    #[test]
    fn test_click_falls_back_to_synthetic_pointer() {
        let (mut engine, registry, mut store, el) = single("card", HeadlessElement::container());
        engine.act(&registry, &mut store, &Instruction::click("card"));
        assert_eq!(el.activations(), 0);
        assert_eq!(el.events(), vec![UiEvent::PointerClick]);
    }

    #[test]
    fn test_unknown_marker_records_nothing() {
        let (mut engine, registry, mut store, _el) = single("save", HeadlessElement::button());
        for instr in [
            Instruction::click("nope"),
            Instruction::highlight("nope"),
            Instruction::scroll("nope"),
            Instruction::fill_input("nope", "x"),
        ] {
            let outcome = engine.act(&registry, &mut store, &instr);
            assert_eq!(outcome, ActOutcome::NotFound("nope".to_string()));
        }
        assert_eq!(store.event_count(), 0);
    }

    #[test]
    fn test_navigate_sets_route_and_calls_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut engine = InstructionEngine::default()
            .with_navigate_hook(move |route| sink.lock().unwrap().push(route.to_string()));
        let registry = MarkerRegistry::new();
        let mut store = StateStore::default();
        let outcome = engine.act(&registry, &mut store, &Instruction::navigate("/billing"));
        assert!(outcome.is_applied());
        assert_eq!(store.route(), Some("/billing"));
        assert_eq!(*seen.lock().unwrap(), vec!["/billing".to_string()]);
        assert_eq!(store.last_event().unwrap().event_type, "navigate");
    }

    #[test]
    fn test_scroll_centers_without_emphasis() {
        let (mut engine, registry, mut store, el) =
            single("faq", HeadlessElement::container().in_viewport(false));
        engine.act(&registry, &mut store, &Instruction::scroll("faq"));
        let state = el.snapshot();
        assert_eq!(state.scrolls, vec![ScrollAlign::Center]);
        assert!(!state.emphasized);
        assert_eq!(store.event_count(), 1);
    }

    #[test]
    fn test_fill_nested_field_dispatches_input_then_change() {
        let field = HeadlessElement::text_input().build();
        let container = HeadlessElement::container()
            .with_child(HeadlessElement::button().build())
            .with_child(field.clone())
            .build();
        let mut registry = MarkerRegistry::new();
        register(&mut registry, "email", &container);
        let mut engine = InstructionEngine::default();
        let mut store = StateStore::default();

        let outcome = engine.act(&registry, &mut store, &Instruction::fill_input("email", "a@b.com"));
        assert_eq!(outcome, ActOutcome::Applied);
        assert_eq!(field.value().as_deref(), Some("a@b.com"));
        assert_eq!(
            field.events(),
            vec![UiEvent::Input { bubbles: true }, UiEvent::Change { bubbles: true }]
        );
        assert!(field.is_focused());
        assert!(container.events().is_empty());
        assert_eq!(store.event_count(), 1);
    }

    #[test]
    fn test_fill_unsupported_target() {
        let (mut engine, registry, mut store, _el) = single("logo", HeadlessElement::container());
        let outcome = engine.act(&registry, &mut store, &Instruction::fill_input("logo", "x"));
        assert_eq!(outcome, ActOutcome::UnsupportedTarget("logo".to_string()));
        assert_eq!(store.event_count(), 0);
    }

    #[test]
    fn test_highlight_without_runtime_skips_emphasis() {
        let (mut engine, registry, mut store, el) = single("plan", HeadlessElement::button());
        engine.act(&registry, &mut store, &Instruction::highlight("plan"));
        assert!(!el.is_emphasized());
        assert_eq!(store.last_event().unwrap().event_type, "highlight");
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_reverts_after_duration() {
        let (mut engine, registry, mut store, el) =
            single("plan", HeadlessElement::button().in_viewport(false));
        engine.act(&registry, &mut store, &Instruction::highlight("plan"));
        assert!(el.is_emphasized());
        assert_eq!(el.scroll_count(), 1);
        sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;
        assert!(!el.is_emphasized());
        assert_eq!(engine.pending_reverts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rehighlight_restarts_timer() {
        let (mut engine, registry, mut store, el) = single("plan", HeadlessElement::button());
        engine.act(&registry, &mut store, &Instruction::highlight("plan"));
        sleep(Duration::from_millis(1500)).await;
        engine.act(&registry, &mut store, &Instruction::highlight("plan"));
        assert_eq!(engine.pending_reverts(), 1);

        // 第一次的还原点（2000ms）已过，但已被取消
        sleep(Duration::from_millis(1000)).await;
        tokio::task::yield_now().await;
        assert!(el.is_emphasized());

        sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert!(!el.is_emphasized());
        assert_eq!(engine.pending_reverts(), 0);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_zero_duration() {
        let (mut engine, registry, mut store, el) =
            single("plan", HeadlessElement::button().in_viewport(false));
        let outcome = engine.highlight_for(&registry, &mut store, "plan", 0);
        assert!(outcome.is_applied());
        assert_eq!(el.scroll_count(), 1);
        assert!(!el.is_emphasized());
        assert_eq!(engine.pending_reverts(), 0);
        assert_eq!(store.last_event().unwrap().event_type, "highlight");
    }
}
