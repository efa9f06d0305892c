//! UseCase: セッション購読の開始
//!
//! 接続を presence に登録し、そのユーザーにとってセッションでの最初の
//! 接続だった場合のみ `joined` イベントを publish する（冪等 join）。

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, ConnectionId, PresenceRegistry, SessionId, UserId,
};
use crate::infrastructure::dto::websocket::{PresenceEventType, PresenceMessage};

/// セッション購読開始のユースケース
pub struct SubscribeSessionUseCase {
    /// PresenceRegistry（接続と在席管理の抽象化）
    presence: Arc<dyn PresenceRegistry>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl SubscribeSessionUseCase {
    /// 新しい SubscribeSessionUseCase を作成
    pub fn new(presence: Arc<dyn PresenceRegistry>, fabric: Arc<dyn BroadcastFabric>) -> Self {
        Self { presence, fabric }
    }

    /// 購読開始を実行
    ///
    /// # Returns
    ///
    /// そのユーザーにとってこのセッションでの最初の接続だったかどうか
    pub async fn execute(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        user_id: &UserId,
    ) -> bool {
        let newly_joined = self
            .presence
            .register(session_id, connection_id, user_id)
            .await;

        // 2 本目以降の接続では joined を再配信しない
        if newly_joined {
            let envelope = PresenceMessage {
                r#type: PresenceEventType::Joined,
                user_id: user_id.as_str().to_string(),
            };
            let key = ChannelKey::new(session_id.clone(), ChannelKind::Presence);
            super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;
        }

        newly_joined
    }
}
