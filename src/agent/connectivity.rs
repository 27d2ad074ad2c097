//! 离线标记：宿主在网络状态变化时切换，Auto 模式每次请求读取

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct ConnectivityFlag {
    offline: Arc<AtomicBool>,
}

impl ConnectivityFlag {
    pub fn new(offline: bool) -> Self {
        Self {
            offline: Arc::new(AtomicBool::new(offline)),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }
}
