//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! セッションごとに独立した Mutex を持つ registry（ID で引くアリーナ）として
//! 実装し、同一セッションの変更を直列化しつつ、別セッションの操作は
//! 互いにブロックしない。外側のマップロックは Arc の取得・挿入の間だけ
//! 保持し、セッション本体のロックを跨いで保持しない。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    AppliedEdit, Language, RepositoryError, Session, SessionId, SessionRepository, SessionSnapshot,
    UserId,
};

/// インメモリ Session Repository 実装
pub struct InMemorySessionRepository {
    /// SessionId → 独立ロック付きセッションエンティティ
    sessions: Mutex<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl InMemorySessionRepository {
    /// 新しい InMemorySessionRepository を作成
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// セッションの Arc を取得する（なければ遅延初期化）
    async fn entry(&self, session_id: &SessionId) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(session_id.clone()))))
            .clone()
    }
}

impl Default for InMemorySessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn apply_edit(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        text: String,
    ) -> AppliedEdit {
        let entry = self.entry(session_id).await;
        let mut session = entry.lock().await;
        session.apply_edit(user_id, text)
    }

    async fn snapshot(&self, session_id: &SessionId) -> SessionSnapshot {
        let entry = self.entry(session_id).await;
        let session = entry.lock().await;
        session.snapshot()
    }

    async fn set_language(&self, session_id: &SessionId, language: Language) {
        let entry = self.entry(session_id).await;
        let mut session = entry.lock().await;
        session.set_language(language);
    }

    async fn remove(&self, session_id: &SessionId) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::SessionNotFound(
                session_id.as_str().to_string(),
            )),
        }
    }

    async fn exists(&self, session_id: &SessionId) -> bool {
        let sessions = self.sessions.lock().await;
        sessions.contains_key(session_id)
    }
}
