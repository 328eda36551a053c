//! 会话表
//!
//! 进程级的连接 → 会话映射。只在连接建立/断开时增删，只在进程退出时遍历。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use protocol::ConnectionId;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::session::Session;

/// 会话表
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ConnectionId, Arc<Session>>>,
    /// ID 生成器
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// 生成新的连接 ID
    pub fn next_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 登记会话
    pub fn register(&self, session: Arc<Session>) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(session.id(), session);
        }
    }

    /// 移除会话
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Session>> {
        self.sessions.lock().ok()?.remove(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions
            .lock()
            .map(|sessions| sessions.contains_key(&id))
            .unwrap_or(false)
    }

    /// 当前会话数量
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 进程退出前终止所有会话的引擎，每个会话最多等待 `grace`。返回被终止的引擎数量
    ///
    /// 各会话并发关闭，一个会话超时不影响其余会话。
    pub async fn shutdown_all(&self, grace: Duration) -> usize {
        let sessions: Vec<Arc<Session>> = match self.sessions.lock() {
            Ok(mut sessions) => sessions.drain().map(|(_, session)| session).collect(),
            Err(_) => Vec::new(),
        };
        info!(count = sessions.len(), "正在关闭所有会话");

        let mut tasks = JoinSet::new();
        for session in sessions {
            tasks.spawn(async move {
                match timeout(grace, session.teardown()).await {
                    Ok(terminated) => terminated,
                    Err(_) => {
                        warn!(conn = session.id(), "关闭会话超时");
                        false
                    }
                }
            });
        }

        let mut terminated = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => terminated += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "关闭会话任务异常"),
            }
        }
        terminated
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
