//! 内存中的无头 UI 元素：供测试与演示程序使用
//!
//! 记录所有激活、滚动、强调、派发的事件，便于断言执行引擎的行为。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::element::{ElementKind, ScrollAlign, UiElement, UiEvent};

#[derive(Clone, Debug, Default)]
pub struct HeadlessState {
    pub value: Option<String>,
    pub in_viewport: bool,
    pub emphasized: bool,
    pub focused: bool,
    pub activations: usize,
    pub scrolls: Vec<ScrollAlign>,
    pub events: Vec<UiEvent>,
}

pub struct HeadlessElement {
    kind: ElementKind,
    native_activation: bool,
    children: Vec<Arc<dyn UiElement>>,
    state: Mutex<HeadlessState>,
}

impl HeadlessElement {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            native_activation: true,
            children: Vec::new(),
            state: Mutex::new(HeadlessState {
                in_viewport: true,
                ..HeadlessState::default()
            }),
        }
    }

    pub fn button() -> Self {
        Self::new(ElementKind::Button)
    }

    pub fn link() -> Self {
        Self::new(ElementKind::Link)
    }

    pub fn text_input() -> Self {
        Self::new(ElementKind::TextInput)
    }

    /// 不可编辑、没有原生激活的容器
    pub fn container() -> Self {
        Self::new(ElementKind::Other).with_native_activation(false)
    }

    pub fn with_native_activation(mut self, native: bool) -> Self {
        self.native_activation = native;
        self
    }

    pub fn with_child(mut self, child: Arc<dyn UiElement>) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_value(self, value: impl Into<String>) -> Self {
        self.lock().value = Some(value.into());
        self
    }

    pub fn in_viewport(self, visible: bool) -> Self {
        self.lock().in_viewport = visible;
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_in_viewport(&self, visible: bool) {
        self.lock().in_viewport = visible;
    }

    pub fn snapshot(&self) -> HeadlessState {
        self.lock().clone()
    }

    pub fn value(&self) -> Option<String> {
        self.lock().value.clone()
    }

    pub fn is_emphasized(&self) -> bool {
        self.lock().emphasized
    }

    pub fn is_focused(&self) -> bool {
        self.lock().focused
    }

    pub fn activations(&self) -> usize {
        self.lock().activations
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.lock().events.clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.lock().scrolls.len()
    }
}

impl UiElement for HeadlessElement {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn activate(&self) -> bool {
        if !self.native_activation {
            return false;
        }
        self.lock().activations += 1;
        true
    }

    fn dispatch(&self, event: UiEvent) {
        self.lock().events.push(event);
    }

    fn is_in_viewport(&self) -> bool {
        self.lock().in_viewport
    }

    fn scroll_into_view(&self, align: ScrollAlign) {
        let mut state = self.lock();
        state.scrolls.push(align);
        state.in_viewport = true;
    }

    fn set_emphasis(&self, on: bool) {
        self.lock().emphasized = on;
    }

    fn set_native_value(&self, value: &str) {
        self.lock().value = Some(value.to_string());
    }

    fn focus(&self) {
        self.lock().focused = true;
    }

    fn children(&self) -> Vec<Arc<dyn UiElement>> {
        self.children.clone()
    }

    fn current_value(&self) -> Option<String> {
        if self.kind.is_editable() {
            self.lock().value.clone()
        } else {
            None
        }
    }
}
