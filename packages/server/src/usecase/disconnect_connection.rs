//! UseCase: トランスポート切断の処理
//!
//! 切断イベントは ConnectionId しか持たないため、presence から所属
//! セッションとユーザーを逆引きし、そのユーザーの **最後の** 接続で
//! あったセッションについてのみ `left` を publish する。
//! 切断通知は再配送されうるため、操作全体が冪等である。

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, ConnectionId, ConnectionPusher, Departure,
    PresenceRegistry,
};
use crate::infrastructure::dto::websocket::{PresenceEventType, PresenceMessage};

/// トランスポート切断処理のユースケース
pub struct DisconnectConnectionUseCase {
    /// PresenceRegistry（接続と在席管理の抽象化）
    presence: Arc<dyn PresenceRegistry>,
    /// ConnectionPusher（クライアントへの送信チャンネル管理の抽象化）
    pusher: Arc<dyn ConnectionPusher>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl DisconnectConnectionUseCase {
    /// 新しい DisconnectConnectionUseCase を作成
    pub fn new(
        presence: Arc<dyn PresenceRegistry>,
        pusher: Arc<dyn ConnectionPusher>,
        fabric: Arc<dyn BroadcastFabric>,
    ) -> Self {
        Self {
            presence,
            pusher,
            fabric,
        }
    }

    /// 切断処理を実行
    ///
    /// # Returns
    ///
    /// 結果として退出となった (session, user) の組。呼び出し側は
    /// ローカル購読者が residual に残っていないセッションの購読解除に使う。
    pub async fn execute(&self, connection_id: &ConnectionId) -> Vec<Departure> {
        // 未知の ConnectionId（再配送された切断通知）なら departures は空
        let departures = self.presence.remove_connection(connection_id).await;

        for departure in &departures {
            let envelope = PresenceMessage {
                r#type: PresenceEventType::Left,
                user_id: departure.user_id.as_str().to_string(),
            };
            let key = ChannelKey::new(departure.session_id.clone(), ChannelKind::Presence);
            super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;
        }

        self.pusher.unregister_connection(connection_id).await;

        departures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionId, UserId};
    use crate::infrastructure::fabric::InProcessFabric;
    use crate::infrastructure::message_pusher::WebSocketConnectionPusher;
    use crate::infrastructure::repository::InMemoryPresenceRegistry;

    fn session_id(value: &str) -> SessionId {
        SessionId::new(value.to_string()).unwrap()
    }

    fn user_id(value: &str) -> UserId {
        UserId::new(value.to_string()).unwrap()
    }

    fn connection_id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn create_usecase() -> (
        Arc<InMemoryPresenceRegistry>,
        Arc<InProcessFabric>,
        DisconnectConnectionUseCase,
    ) {
        let presence = Arc::new(InMemoryPresenceRegistry::new());
        let pusher = Arc::new(WebSocketConnectionPusher::new());
        let fabric = Arc::new(InProcessFabric::new());
        let usecase =
            DisconnectConnectionUseCase::new(presence.clone(), pusher, fabric.clone());
        (presence, fabric, usecase)
    }

    #[tokio::test]
    async fn test_last_connection_publishes_left() {
        // テスト項目: ユーザーの最後の接続の切断で left が publish される
        // given (前提条件):
        let (presence, fabric, usecase) = create_usecase();
        let sid = session_id("s1");
        let alice = user_id("alice");
        presence.register(&sid, &connection_id("c1"), &alice).await;

        let key = ChannelKey::new(sid.clone(), ChannelKind::Presence);
        let mut rx = fabric.subscribe(&key).await;

        // when (操作):
        let departures = usecase.execute(&connection_id("c1")).await;

        // then (期待する結果):
        assert_eq!(departures.len(), 1);
        let payload = rx.recv().await.unwrap();
        let envelope: PresenceMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(envelope.r#type, PresenceEventType::Left);
        assert_eq!(envelope.user_id, "alice");
    }

    #[tokio::test]
    async fn test_disconnect_with_remaining_connection_is_silent() {
        // テスト項目: 同一ユーザーの別接続が残っていれば left は publish されない
        // given (前提条件):
        let (presence, fabric, usecase) = create_usecase();
        let sid = session_id("s1");
        let alice = user_id("alice");
        presence.register(&sid, &connection_id("c1"), &alice).await;
        presence.register(&sid, &connection_id("c2"), &alice).await;

        let key = ChannelKey::new(sid.clone(), ChannelKind::Presence);
        let mut rx = fabric.subscribe(&key).await;

        // when (操作): 片方だけ切断
        let departures = usecase.execute(&connection_id("c1")).await;

        // then (期待する結果): 退出にはならない
        assert!(departures.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_redelivered_disconnect_is_idempotent() {
        // テスト項目: 再配送された切断通知は黙って無視される
        // given (前提条件):
        let (presence, fabric, usecase) = create_usecase();
        let sid = session_id("s1");
        presence
            .register(&sid, &connection_id("c1"), &user_id("alice"))
            .await;

        let key = ChannelKey::new(sid.clone(), ChannelKind::Presence);
        let mut rx = fabric.subscribe(&key).await;

        usecase.execute(&connection_id("c1")).await;
        rx.recv().await.unwrap();

        // when (操作): 同じ切断通知をもう一度処理
        let departures = usecase.execute(&connection_id("c1")).await;

        // then (期待する結果): 2 回目は何も起きない
        assert!(departures.is_empty());
        assert!(rx.try_recv().is_err());
    }
}
