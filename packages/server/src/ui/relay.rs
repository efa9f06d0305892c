//! Session relay: fabric から届いたエンベロープをローカル接続へ fan-out する。
//!
//! インスタンスはローカルに購読者がいるセッションについて全チャンネル種別を
//! 購読し、届いたエンベロープをトピックパス付きのフレームに包んで、その
//! セッションを購読中の全ローカル接続へ push する。publish 元が自インスタンス
//! かどうかは区別しない（自己配送前提の対称な経路）。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, ConnectionPusher, PresenceRegistry, SessionId,
};
use crate::infrastructure::dto::websocket::ServerFrame;

/// fabric とローカル接続をつなぐ per-session relay
pub struct SessionRelay {
    fabric: Arc<dyn BroadcastFabric>,
    presence: Arc<dyn PresenceRegistry>,
    pusher: Arc<dyn ConnectionPusher>,
    /// チャンネル名 → 転送タスク
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl SessionRelay {
    /// 新しい SessionRelay を作成
    pub fn new(
        fabric: Arc<dyn BroadcastFabric>,
        presence: Arc<dyn PresenceRegistry>,
        pusher: Arc<dyn ConnectionPusher>,
    ) -> Self {
        Self {
            fabric,
            presence,
            pusher,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// セッションの全チャンネル種別の購読を開始する（冪等）
    ///
    /// joined イベントの publish 前に呼ぶこと。購読開始以降のエンベロープ
    /// しか届かないため、順序が逆だと購読者自身の joined を取りこぼす。
    pub async fn ensure_session(&self, session_id: &SessionId) {
        let mut tasks = self.tasks.lock().await;
        for kind in ChannelKind::ALL {
            let key = ChannelKey::new(session_id.clone(), kind);
            let name = key.channel_name();
            if tasks.contains_key(&name) {
                continue;
            }
            let rx = self.fabric.subscribe(&key).await;
            let task = self.spawn_forward_loop(key, rx);
            tasks.insert(name, task);
        }
    }

    /// セッションの購読をすべて解除する
    ///
    /// ローカル購読者がいなくなったセッション、または終了したセッションで
    /// 呼ばれる。再購読は次の ensure_session で行われる。
    pub async fn release_session(&self, session_id: &SessionId) {
        let mut tasks = self.tasks.lock().await;
        for kind in ChannelKind::ALL {
            let name = ChannelKey::new(session_id.clone(), kind).channel_name();
            if let Some(task) = tasks.remove(&name) {
                task.abort();
            }
        }
    }

    fn spawn_forward_loop(
        &self,
        key: ChannelKey,
        mut rx: broadcast::Receiver<String>,
    ) -> JoinHandle<()> {
        let presence = Arc::clone(&self.presence);
        let pusher = Arc::clone(&self.pusher);
        tokio::spawn(async move {
            let topic = key.topic_path();
            loop {
                let payload = match rx.recv().await {
                    Ok(payload) => payload,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Relay lagged on '{}', skipped {} envelopes",
                            key.channel_name(),
                            skipped
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };

                // 解読できないエンベロープは落としてログする（配信は止めない）
                let value: serde_json::Value = match serde_json::from_str(&payload) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(
                            "Dropping undecodable envelope on '{}': {}",
                            key.channel_name(),
                            e
                        );
                        continue;
                    }
                };

                let frame = ServerFrame {
                    topic: topic.clone(),
                    payload: value,
                };
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("Failed to serialize relay frame: {}", e);
                        continue;
                    }
                };

                let targets = presence.local_connections(&key.session_id).await;
                pusher.push_to_many(&targets, &json).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use super::*;
    use crate::domain::{ConnectionId, UserId};
    use crate::infrastructure::fabric::InProcessFabric;
    use crate::infrastructure::message_pusher::WebSocketConnectionPusher;
    use crate::infrastructure::repository::InMemoryPresenceRegistry;

    fn session_id(value: &str) -> SessionId {
        SessionId::new(value.to_string()).unwrap()
    }

    async fn create_relay() -> (
        Arc<InProcessFabric>,
        Arc<InMemoryPresenceRegistry>,
        Arc<WebSocketConnectionPusher>,
        SessionRelay,
    ) {
        let fabric = Arc::new(InProcessFabric::new());
        let presence = Arc::new(InMemoryPresenceRegistry::new());
        let pusher = Arc::new(WebSocketConnectionPusher::new());
        let relay = SessionRelay::new(fabric.clone(), presence.clone(), pusher.clone());
        (fabric, presence, pusher, relay)
    }

    async fn connect(
        presence: &InMemoryPresenceRegistry,
        pusher: &WebSocketConnectionPusher,
        sid: &SessionId,
        connection: &str,
        user: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let connection_id = ConnectionId::new(connection.to_string()).unwrap();
        let user_id = UserId::new(user.to_string()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_connection(connection_id.clone(), tx).await;
        presence.register(sid, &connection_id, &user_id).await;
        rx
    }

    #[tokio::test]
    async fn test_envelope_is_forwarded_to_all_local_connections() {
        // テスト項目: publish されたエンベロープが全ローカル接続へ届く
        // given (前提条件):
        let (fabric, presence, pusher, relay) = create_relay().await;
        let sid = session_id("s1");
        let mut rx_alice = connect(&presence, &pusher, &sid, "c1", "alice").await;
        let mut rx_bob = connect(&presence, &pusher, &sid, "c2", "bob").await;

        relay.ensure_session(&sid).await;

        // when (操作):
        let key = ChannelKey::new(sid.clone(), ChannelKind::Chat);
        fabric
            .publish(&key, r#"{"content":"hello"}"#.to_string())
            .await
            .unwrap();

        // then (期待する結果): 両接続にトピック付きフレームが届く
        for rx in [&mut rx_alice, &mut rx_bob] {
            let json = timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            let frame: ServerFrame = serde_json::from_str(&json).unwrap();
            assert_eq!(frame.topic, "/topic/session/s1/chat");
            assert_eq!(frame.payload["content"], "hello");
        }
    }

    #[tokio::test]
    async fn test_ensure_session_is_idempotent() {
        // テスト項目: ensure_session を重ねて呼んでも二重配信されない
        // given (前提条件):
        let (fabric, presence, pusher, relay) = create_relay().await;
        let sid = session_id("s1");
        let mut rx = connect(&presence, &pusher, &sid, "c1", "alice").await;

        relay.ensure_session(&sid).await;
        relay.ensure_session(&sid).await;

        // when (操作):
        let key = ChannelKey::new(sid.clone(), ChannelKind::Edit);
        fabric
            .publish(&key, r#"{"text":"x"}"#.to_string())
            .await
            .unwrap();

        // then (期待する結果): フレームは 1 通だけ
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_undecodable_envelope_is_dropped() {
        // テスト項目: 解読できないエンベロープは落とされ、後続は配信される
        // given (前提条件):
        let (fabric, presence, pusher, relay) = create_relay().await;
        let sid = session_id("s1");
        let mut rx = connect(&presence, &pusher, &sid, "c1", "alice").await;

        relay.ensure_session(&sid).await;

        // when (操作): 壊れたペイロードに続いて正常なペイロードを publish
        let key = ChannelKey::new(sid.clone(), ChannelKind::Terminal);
        fabric
            .publish(&key, "not-json".to_string())
            .await
            .unwrap();
        fabric
            .publish(&key, r#"{"output":"1\n"}"#.to_string())
            .await
            .unwrap();

        // then (期待する結果): 届くのは正常なフレームだけ
        let json = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        let frame: ServerFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(frame.payload["output"], "1\n");
    }

    #[tokio::test]
    async fn test_release_session_stops_forwarding() {
        // テスト項目: release_session 後はエンベロープが転送されない
        // given (前提条件):
        let (fabric, presence, pusher, relay) = create_relay().await;
        let sid = session_id("s1");
        let mut rx = connect(&presence, &pusher, &sid, "c1", "alice").await;

        relay.ensure_session(&sid).await;
        relay.release_session(&sid).await;

        // when (操作):
        let key = ChannelKey::new(sid.clone(), ChannelKind::Chat);
        fabric
            .publish(&key, r#"{"content":"hello"}"#.to_string())
            .await
            .unwrap();

        // then (期待する結果):
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }
}
