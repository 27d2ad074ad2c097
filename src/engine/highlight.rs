//! 高亮还原计时器
//!
//! 每个 Marker id 至多一个待执行的还原任务；再次高亮同一 id 会取消旧任务并以新时长重新计时（后写者胜，不排队）。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::markers::UiElement;

#[derive(Default)]
pub struct RevertTimers {
    pending: HashMap<String, JoinHandle<()>>,
}

impl RevertTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消同 id 的旧计时器并安排新的还原；顺带丢弃已触发的句柄。当前线程没有 tokio 运行时则返回 false
    pub fn schedule(&mut self, id: &str, element: &Arc<dyn UiElement>, delay: Duration) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };
        self.cancel(id);
        self.pending.retain(|_, task| !task.is_finished());

        let target = Arc::downgrade(element);
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(el) = target.upgrade() {
                el.set_emphasis(false);
            }
        });
        self.pending.insert(id.to_string(), task);
        true
    }

    /// 取消 id 的计时器；返回是否确有未完成的计时器被取消
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.pending.remove(id) {
            Some(task) => {
                let live = !task.is_finished();
                task.abort();
                live
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }

    /// 尚未触发的还原数量
    pub fn pending(&self) -> usize {
        self.pending.values().filter(|t| !t.is_finished()).count()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.get(id).is_some_and(|t| !t.is_finished())
    }
}

impl Drop for RevertTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
