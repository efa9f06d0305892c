//! UseCase: チャットメッセージの中継
//!
//! チャットは保存されない。サーバー側でタイムスタンプを付与して
//! chat チャンネルへ publish するだけの pure relay。

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{BroadcastFabric, ChannelKey, ChannelKind, SessionId, UserId};
use crate::infrastructure::dto::websocket::ChatMessage;

/// チャット中継のユースケース
pub struct SendChatUseCase {
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
    /// Clock（タイムスタンプ取得の抽象化、テストで固定可能）
    clock: Arc<dyn Clock>,
}

impl SendChatUseCase {
    /// 新しい SendChatUseCase を作成
    pub fn new(fabric: Arc<dyn BroadcastFabric>, clock: Arc<dyn Clock>) -> Self {
        Self { fabric, clock }
    }

    /// チャット中継を実行
    ///
    /// `user_id` は Gateway が認証済み接続から解決したものを渡す
    /// （クライアント申告の値は使わない）。
    pub async fn execute(&self, session_id: &SessionId, user_id: &UserId, content: String) {
        let envelope = ChatMessage {
            session_id: session_id.as_str().to_string(),
            user_id: user_id.as_str().to_string(),
            content,
            timestamp: self.clock.now_millis(),
        };
        let key = ChannelKey::new(session_id.clone(), ChannelKind::Chat);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;
    }
}
