//! InMemory Sandbox Registry 実装
//!
//! セッションごとの SandboxHandle を保持する。各ハンドルは独立した
//! Mutex で保護され、遅い driver 操作（create / start / stop）の間も
//! 他セッションの sandbox 操作をブロックしない。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{SandboxHandle, SandboxRegistry, SessionId};

/// インメモリ Sandbox Registry 実装
pub struct InMemorySandboxRegistry {
    handles: Mutex<HashMap<SessionId, Arc<Mutex<SandboxHandle>>>>,
}

impl InMemorySandboxRegistry {
    /// 新しい InMemorySandboxRegistry を作成
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySandboxRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxRegistry for InMemorySandboxRegistry {
    async fn entry(&self, session_id: &SessionId) -> Arc<Mutex<SandboxHandle>> {
        let mut handles = self.handles.lock().await;
        handles
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SandboxHandle::for_session(session_id))))
            .clone()
    }

    async fn get(&self, session_id: &SessionId) -> Option<Arc<Mutex<SandboxHandle>>> {
        let handles = self.handles.lock().await;
        handles.get(session_id).cloned()
    }

    async fn take(&self, session_id: &SessionId) -> Option<Arc<Mutex<SandboxHandle>>> {
        let mut handles = self.handles.lock().await;
        handles.remove(session_id)
    }
}
