//! UseCase: セッションメタデータ（実行言語）の更新
//!
//! 言語の選択を Repository に反映し、meta チャンネルへ broadcast する。
//! 遅れて購読したクライアントの同期用に最新のドキュメント全文を同梱する。

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, Language, SessionId, SessionRepository, UserId,
};
use crate::infrastructure::dto::websocket::SessionMetaMessage;

/// セッションメタデータ更新のユースケース
pub struct UpdateSessionMetaUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl UpdateSessionMetaUseCase {
    /// 新しい UpdateSessionMetaUseCase を作成
    pub fn new(repository: Arc<dyn SessionRepository>, fabric: Arc<dyn BroadcastFabric>) -> Self {
        Self { repository, fabric }
    }

    /// メタデータ更新を実行
    pub async fn execute(&self, session_id: &SessionId, language: Language, user_id: &UserId) {
        self.repository.set_language(session_id, language).await;

        let snapshot = self.repository.snapshot(session_id).await;
        let latest_code = if snapshot.document.is_empty() {
            None
        } else {
            Some(snapshot.document)
        };

        let envelope = SessionMetaMessage::language(
            language.as_str().to_string(),
            user_id.as_str().to_string(),
            latest_code,
        );
        let key = ChannelKey::new(session_id.clone(), ChannelKind::Meta);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;
    }
}
