//! Marker 注册表
//!
//! id → (Marker 元数据, 非拥有的元素句柄)。组件挂载时 register、卸载或 id 变更时 unregister，
//! 注册表不做后台清扫：元素被销毁却未注销时，resolve 返回 None，由执行引擎按 NotFound 处理。
//!
//! 文档顺序按「首次挂载顺序」建模：每个 id 首次注册时分配一个槽位并永久保留，
//! 注销后再次注册会回到原来的位置。

pub mod element;
pub mod headless;

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::protocol::Marker;

pub use element::{first_editable_descendant, ElementKind, ScrollAlign, UiElement, UiEvent};
pub use headless::{HeadlessElement, HeadlessState};

struct MarkerEntry {
    marker: Marker,
    element: Weak<dyn UiElement>,
    slot: u64,
}

/// 单写者（宿主 UI 线程）注册表，无内部锁
#[derive(Default)]
pub struct MarkerRegistry {
    entries: HashMap<String, MarkerEntry>,
    /// 每个出现过的 id 的槽位；注销后仍保留，clear 时才释放
    slots: HashMap<String, u64>,
    next_slot: u64,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 id upsert；同一 id 重复注册覆盖元数据与句柄，位置不变
    pub fn register(&mut self, marker: Marker, element: &Arc<dyn UiElement>) {
        let slot = match self.slots.get(&marker.id) {
            Some(slot) => *slot,
            None => {
                let slot = self.next_slot;
                self.next_slot += 1;
                self.slots.insert(marker.id.clone(), slot);
                slot
            }
        };
        tracing::debug!(marker = %marker.id, slot, "marker registered");
        self.entries.insert(
            marker.id.clone(),
            MarkerEntry {
                marker,
                element: Arc::downgrade(element),
                slot,
            },
        );
    }

    /// 移除条目；不存在时为空操作并返回 false
    pub fn unregister(&mut self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        if removed {
            tracing::debug!(marker = %id, "marker unregistered");
        }
        removed
    }

    /// 解析为存活的元素句柄
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn UiElement>> {
        self.entries.get(id).and_then(|e| e.element.upgrade())
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.entries.get(id).map(|e| &e.marker)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 按文档顺序列出 (元数据, 存活句柄)
    pub fn entries(&self) -> Vec<(&Marker, Option<Arc<dyn UiElement>>)> {
        let mut entries: Vec<&MarkerEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.slot);
        entries
            .into_iter()
            .map(|e| (&e.marker, e.element.upgrade()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空全部条目与槽位记录
    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
        self.next_slot = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(el: &Arc<HeadlessElement>) -> Arc<dyn UiElement> {
        el.clone()
    }

    fn ids(registry: &MarkerRegistry) -> Vec<String> {
        registry.entries().iter().map(|(m, _)| m.id.clone()).collect()
    }

    #[test]
    fn test_register_is_upsert() {
        let mut registry = MarkerRegistry::new();
        let el = HeadlessElement::button().build();
        registry.register(Marker::new("save", "Save", "save form", "button"), &handle(&el));
        registry.register(Marker::new("save", "Save changes", "save form", "button"), &handle(&el));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.marker("save").unwrap().label, "Save changes");
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = MarkerRegistry::new();
        assert!(!registry.unregister("missing"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reregister_restores_position() {
        let mut registry = MarkerRegistry::new();
        let el = HeadlessElement::button().build();
        for id in ["a", "b", "c"] {
            registry.register(Marker::new(id, id, id, "button"), &handle(&el));
        }
        assert!(registry.unregister("b"));
        assert_eq!(ids(&registry), vec!["a", "c"]);
        registry.register(Marker::new("b", "b", "b", "button"), &handle(&el));
        assert_eq!(ids(&registry), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dropped_element_does_not_resolve() {
        let mut registry = MarkerRegistry::new();
        let el = HeadlessElement::button().build();
        registry.register(Marker::new("tmp", "Tmp", "tmp", "button"), &handle(&el));
        assert!(registry.resolve("tmp").is_some());
        drop(el);
        assert!(registry.resolve("tmp").is_none());
        // 元数据仍在，直到宿主显式注销
        assert!(registry.contains("tmp"));
    }
}
