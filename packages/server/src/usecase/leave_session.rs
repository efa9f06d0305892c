//! UseCase: セッションからの明示的な離脱
//!
//! 明示的な leave は接続管理とは独立に、そのユーザーの他の接続が
//! 残っていても無条件に `left` を publish する（意図的な非対称性）。
//! 接続自体の後始末はトランスポート切断側の責務。

use std::sync::Arc;

use crate::domain::{BroadcastFabric, ChannelKey, ChannelKind, SessionId, UserId};
use crate::infrastructure::dto::websocket::{PresenceEventType, PresenceMessage};

/// 明示的離脱のユースケース
pub struct LeaveSessionUseCase {
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl LeaveSessionUseCase {
    /// 新しい LeaveSessionUseCase を作成
    pub fn new(fabric: Arc<dyn BroadcastFabric>) -> Self {
        Self { fabric }
    }

    /// 明示的離脱を実行
    pub async fn execute(&self, session_id: &SessionId, user_id: &UserId) {
        let envelope = PresenceMessage {
            r#type: PresenceEventType::Left,
            user_id: user_id.as_str().to_string(),
        };
        let key = ChannelKey::new(session_id.clone(), ChannelKind::Presence);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fabric::InProcessFabric;

    #[tokio::test]
    async fn test_explicit_leave_always_publishes_left() {
        // テスト項目: 明示的 leave は presence の状態に関係なく left を publish する
        // given (前提条件): presence には何も登録されていない
        let fabric = Arc::new(InProcessFabric::new());
        let usecase = LeaveSessionUseCase::new(fabric.clone());

        let sid = SessionId::new("s1".to_string()).unwrap();
        let alice = UserId::new("alice".to_string()).unwrap();
        let key = ChannelKey::new(sid.clone(), ChannelKind::Presence);
        let mut rx = fabric.subscribe(&key).await;

        // when (操作):
        usecase.execute(&sid, &alice).await;

        // then (期待する結果):
        let payload = rx.recv().await.unwrap();
        let envelope: PresenceMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(envelope.r#type, PresenceEventType::Left);
        assert_eq!(envelope.user_id, "alice");
    }
}
