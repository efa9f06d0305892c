//! InMemory Presence Registry 実装
//!
//! 接続 → (ユーザー, 購読セッション集合) と セッション → 接続集合 の
//! 2 方向のマップを 1 つのロックで保護する。presence（あるユーザーが
//! セッションに「いる」かどうか）は保存せず、これらのマップから
//! 都度導出する。同一ユーザーの複数接続を二重カウントしないための設計。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, Departure, PresenceRegistry, SessionId, UserId};

/// 接続 1 本分の追跡情報
struct ConnectionEntry {
    user_id: UserId,
    sessions: HashSet<SessionId>,
}

#[derive(Default)]
struct State {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    session_connections: HashMap<SessionId, HashSet<ConnectionId>>,
}

impl State {
    /// セッション内でユーザーが保持する接続数を数える
    fn user_connection_count(&self, session_id: &SessionId, user_id: &UserId) -> usize {
        self.session_connections
            .get(session_id)
            .map(|connections| {
                connections
                    .iter()
                    .filter(|connection_id| {
                        self.connections
                            .get(connection_id)
                            .is_some_and(|entry| &entry.user_id == user_id)
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}

/// インメモリ Presence Registry 実装
pub struct InMemoryPresenceRegistry {
    state: Mutex<State>,
}

impl InMemoryPresenceRegistry {
    /// 新しい InMemoryPresenceRegistry を作成
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }
}

impl Default for InMemoryPresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresenceRegistry {
    async fn register(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        user_id: &UserId,
    ) -> bool {
        let mut state = self.state.lock().await;

        let had_presence = state.user_connection_count(session_id, user_id) > 0;

        let entry = state
            .connections
            .entry(connection_id.clone())
            .or_insert_with(|| ConnectionEntry {
                user_id: user_id.clone(),
                sessions: HashSet::new(),
            });
        entry.sessions.insert(session_id.clone());

        state
            .session_connections
            .entry(session_id.clone())
            .or_default()
            .insert(connection_id.clone());

        // 既に別接続で在席していたなら joined は出さない（冪等 join）
        !had_presence
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<Departure> {
        let mut state = self.state.lock().await;

        // 未知の接続（再配送された切断通知を含む）は黙って無視する
        let Some(entry) = state.connections.remove(connection_id) else {
            return Vec::new();
        };

        let mut departures = Vec::new();
        for session_id in entry.sessions {
            if let Some(connections) = state.session_connections.get_mut(&session_id) {
                connections.remove(connection_id);
                if connections.is_empty() {
                    state.session_connections.remove(&session_id);
                }
            }

            // 同一ユーザーの別接続が残っていなければ退出扱い
            if state.user_connection_count(&session_id, &entry.user_id) == 0 {
                departures.push(Departure {
                    session_id,
                    user_id: entry.user_id.clone(),
                });
            }
        }

        departures
    }

    async fn local_connections(&self, session_id: &SessionId) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        state
            .session_connections
            .get(session_id)
            .map(|connections| connections.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn user_connections(&self, user_id: &UserId) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        state
            .connections
            .iter()
            .filter(|(_, entry)| &entry.user_id == user_id)
            .map(|(connection_id, _)| connection_id.clone())
            .collect()
    }

    async fn has_local_interest(&self, session_id: &SessionId) -> bool {
        let state = self.state.lock().await;
        state
            .session_connections
            .get(session_id)
            .is_some_and(|connections| !connections.is_empty())
    }
}
