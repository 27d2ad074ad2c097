//! 状态中心：路由、自定义状态、最近一次应用错误、有界事件日志
//!
//! 两条相互独立的通知通道（tokio broadcast）：
//! - 变更通道：按 [`StoreChange`] 区分 route / state / error
//! - 追踪通道：每次 track 发一个空通知
//!
//! 每个订阅者各自持有 Receiver，某个订阅者掉线或积压不会影响其他订阅者；没有订阅者时发送结果被忽略。

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::protocol::{ErrorMeta, ErrorReport};

/// 事件日志默认容量
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 50;

/// 通知通道缓冲（订阅者落后超过该数量时会收到 Lagged）
const NOTIFY_BUFFER: usize = 64;

/// 变更通道的键
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreChange {
    Route,
    State,
    Error,
}

/// 事件日志中的一条记录
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub timestamp: i64,
}

pub struct StateStore {
    route: Option<String>,
    state: Map<String, Value>,
    error: Option<ErrorReport>,
    events: VecDeque<Event>,
    capacity: usize,
    changes: broadcast::Sender<StoreChange>,
    tracked: broadcast::Sender<()>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl StateStore {
    pub fn new(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(NOTIFY_BUFFER);
        let (tracked, _) = broadcast::channel(NOTIFY_BUFFER);
        Self {
            route: None,
            state: Map::new(),
            error: None,
            events: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            changes,
            tracked,
        }
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    pub fn subscribe_tracked(&self) -> broadcast::Receiver<()> {
        self.tracked.subscribe()
    }

    fn notify(&self, change: StoreChange) {
        let _ = self.changes.send(change);
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
        self.notify(StoreChange::Route);
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// 整体替换状态对象（不与旧状态合并）
    pub fn set_state(&mut self, state: Map<String, Value>) {
        self.state = state;
        self.notify(StoreChange::State);
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        self.error.as_ref()
    }

    pub fn set_error(&mut self, error: Option<ErrorReport>) {
        self.error = error;
        self.notify(StoreChange::Error);
    }

    /// 宿主上报应用错误：以当前时间戳存为数据
    pub fn report_error(&mut self, message: impl Into<String>, meta: Option<ErrorMeta>) {
        self.set_error(Some(ErrorReport::new(message, meta)));
    }

    pub fn clear_error(&mut self) {
        self.set_error(None);
    }

    /// 追加一条事件；超出容量时丢弃最旧的
    pub fn track(&mut self, event_type: impl Into<String>, payload: Option<Value>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            event_type: event_type.into(),
            payload,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
        let _ = self.tracked.send(());
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn last_event(&self) -> Option<&Event> {
        self.events.back()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 清空全部数据；已有订阅者保持连接
    pub fn reset(&mut self) {
        self.route = None;
        self.state.clear();
        self.error = None;
        self.events.clear();
        self.notify(StoreChange::Route);
        self.notify(StoreChange::State);
        self.notify(StoreChange::Error);
    }
}
