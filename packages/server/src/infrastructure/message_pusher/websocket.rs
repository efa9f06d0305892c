//! WebSocket を使った ConnectionPusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - 接続へのメッセージ送信（push_to, push_to_many）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に
//! 使用します。1 ユーザーが複数接続を持ちうるため、キーはユーザーではなく
//! ConnectionId です。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionPusher, MessagePushError, PusherChannel};

/// WebSocket を使った ConnectionPusher 実装
pub struct WebSocketConnectionPusher {
    /// 接続中の WebSocket sender
    ///
    /// Key: ConnectionId
    /// Value: PusherChannel
    connections: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl WebSocketConnectionPusher {
    /// 新しい WebSocketConnectionPusher を作成
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for WebSocketConnectionPusher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionPusher for WebSocketConnectionPusher {
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id.clone(), sender);
        tracing::debug!(
            "Connection '{}' registered to ConnectionPusher",
            connection_id.as_str()
        );
    }

    async fn unregister_connection(&self, connection_id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from ConnectionPusher",
            connection_id.as_str()
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let connections = self.connections.lock().await;

        if let Some(sender) = connections.get(connection_id) {
            sender
                .send(content.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
            Ok(())
        } else {
            Err(MessagePushError::ConnectionNotFound(
                connection_id.as_str().to_string(),
            ))
        }
    }

    async fn push_to_many(&self, targets: &[ConnectionId], content: &str) {
        let connections = self.connections.lock().await;

        for target in targets {
            if let Some(sender) = connections.get(target) {
                // 一部の送信失敗は許容する
                if let Err(e) = sender.send(content.to_string()) {
                    tracing::warn!(
                        "Failed to push message to connection '{}': {}",
                        target.as_str(),
                        e
                    );
                }
            } else {
                tracing::warn!(
                    "Connection '{}' not found during push, skipping",
                    target.as_str()
                );
            }
        }
    }
}
