//! 宿主 UI 元素契约
//!
//! 执行引擎只通过 `UiElement` 操作界面；注册表持有的是 `Weak<dyn UiElement>`，元素的所有权始终在宿主 UI 树。

use std::sync::Arc;

/// 元素类别：决定能否直接填值、导航时优先点击还是滚动
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    TextInput,
    TextArea,
    ContentEditable,
    Link,
    Button,
    Other,
}

impl ElementKind {
    pub fn is_editable(self) -> bool {
        matches!(
            self,
            ElementKind::TextInput | ElementKind::TextArea | ElementKind::ContentEditable
        )
    }
}

/// 引擎向元素派发的通知
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// 合成指针点击（仅在元素没有原生激活行为时使用）
    PointerClick,
    Input { bubbles: bool },
    Change { bubbles: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAlign {
    Start,
    Center,
    Nearest,
}

/// 宿主 UI 元素句柄
pub trait UiElement: Send + Sync {
    fn kind(&self) -> ElementKind;

    /// 调用原生激活行为；元素没有原生激活时返回 false
    fn activate(&self) -> bool;

    fn dispatch(&self, event: UiEvent);

    fn is_in_viewport(&self) -> bool;

    fn scroll_into_view(&self, align: ScrollAlign);

    /// 临时视觉强调（高亮）的开关
    fn set_emphasis(&self, on: bool);

    /// 通过平台底层的 value setter 写值，保证框架层的变更检测能感知
    fn set_native_value(&self, value: &str);

    fn focus(&self);

    /// 直接子元素，按文档顺序
    fn children(&self) -> Vec<Arc<dyn UiElement>>;

    /// 当前值（输入框等）；快照时覆盖注册时的静态 value
    fn current_value(&self) -> Option<String> {
        None
    }
}

/// 前序遍历查找第一个可编辑的后代（不含自身）
pub fn first_editable_descendant(element: &dyn UiElement) -> Option<Arc<dyn UiElement>> {
    for child in element.children() {
        if child.kind().is_editable() {
            return Some(child);
        }
        if let Some(found) = first_editable_descendant(child.as_ref()) {
            return Some(found);
        }
    }
    None
}
