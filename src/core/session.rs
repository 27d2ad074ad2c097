//! 会话：显式持有注册表、状态中心与执行引擎的上下文对象
//!
//! 取代进程级单例：宿主创建一个 Session 并以 `&mut` 传给各组件，测试之间用 `reset` 或新建实例隔离状态。

use std::sync::Arc;

use crate::config::EngineSection;
use crate::core::snapshot;
use crate::core::state::StateStore;
use crate::engine::{ActOutcome, InstructionEngine, NavigateHook};
use crate::markers::{MarkerRegistry, UiElement};
use crate::protocol::{AgentResponse, Context, Instruction, Marker};

#[derive(Default)]
pub struct Session {
    registry: MarkerRegistry,
    store: StateStore,
    engine: InstructionEngine,
}

impl Session {
    pub fn new(highlight_duration_ms: u64, event_log_capacity: usize) -> Self {
        Self {
            registry: MarkerRegistry::new(),
            store: StateStore::new(event_log_capacity),
            engine: InstructionEngine::new(highlight_duration_ms),
        }
    }

    pub fn from_config(engine: &EngineSection) -> Self {
        Self::new(engine.highlight_duration_ms, engine.event_log_capacity)
    }

    pub fn with_navigate_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        let hook: NavigateHook = Box::new(hook);
        self.engine.set_navigate_hook(Some(hook));
        self
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MarkerRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn engine(&self) -> &InstructionEngine {
        &self.engine
    }

    /// 元素挂载
    pub fn mount(&mut self, marker: Marker, element: &Arc<dyn UiElement>) {
        self.registry.register(marker, element);
    }

    /// 元素卸载
    pub fn unmount(&mut self, id: &str) -> bool {
        self.registry.unregister(id)
    }

    pub fn describe(&self) -> Context {
        snapshot::describe(&self.registry, &self.store)
    }

    pub fn act(&mut self, instruction: &Instruction) -> ActOutcome {
        self.engine.act(&self.registry, &mut self.store, instruction)
    }

    pub fn highlight_for(&mut self, id: &str, duration_ms: u64) -> ActOutcome {
        self.engine
            .highlight_for(&self.registry, &mut self.store, id, duration_ms)
    }

    /// 按顺序回放响应中的全部指令
    pub fn apply(&mut self, response: &AgentResponse) -> Vec<ActOutcome> {
        response
            .instructions()
            .iter()
            .map(|instr| self.act(instr))
            .collect()
    }

    /// 清空注册表、状态与待执行的高亮还原
    pub fn reset(&mut self) {
        self.engine.cancel_reverts();
        self.registry.clear();
        self.store.reset();
    }
}
