//! 上下文快照：注册表 + 状态中心在调用时刻的纯读组合，不缓存、无副作用

use crate::core::state::StateStore;
use crate::markers::MarkerRegistry;
use crate::protocol::Context;

/// 构建新的 Context；元素报告的实时值覆盖注册时的静态 value
pub fn describe(registry: &MarkerRegistry, store: &StateStore) -> Context {
    let entries = registry.entries();
    let mut markers = Vec::with_capacity(entries.len());
    let mut in_view = Vec::new();

    for (marker, element) in entries {
        let mut marker = marker.clone();
        if let Some(el) = element {
            if let Some(live) = el.current_value() {
                marker.value = Some(live);
            }
            if el.is_in_viewport() {
                in_view.push(marker.id.clone());
            }
        }
        markers.push(marker);
    }

    Context {
        markers,
        in_view_marker_ids: Some(in_view),
        route: store.route().map(String::from),
        state: (!store.state().is_empty()).then(|| store.state().clone()),
        error: store.error().cloned(),
    }
}
