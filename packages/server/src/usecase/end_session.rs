//! UseCase: セッションの終了
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - EndSessionUseCase::execute() メソッド
//! - sandbox の teardown、セッション状態の破棄、end チャンネルへの通知
//!
//! ### なぜこのテストが必要か
//! - teardown 中の driver 失敗が終了処理を止めないことを保証
//! - 存在しないセッションの終了が確定的な失敗として返ることを確認
//! - 終了通知がすべての購読者に届く経路（end チャンネル）の検証
//!
//! ### どのような状況を想定しているか
//! - 正常系：sandbox あり / なしでのセッション終了
//! - 異常系：未知のセッション、driver の stop / remove 失敗
//! - エッジケース：sandbox 未作成（status = None）のままの終了

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, SandboxDriver, SandboxRegistry, SandboxStatus,
    SessionId, SessionRepository, UserId,
};
use crate::infrastructure::dto::websocket::SessionEndMessage;

use super::error::EndSessionError;

/// セッション終了のユースケース
pub struct EndSessionUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// SandboxRegistry（セッションごとのハンドル管理の抽象化）
    registry: Arc<dyn SandboxRegistry>,
    /// SandboxDriver（外部実行環境操作の抽象化）
    driver: Arc<dyn SandboxDriver>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl EndSessionUseCase {
    /// 新しい EndSessionUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        registry: Arc<dyn SandboxRegistry>,
        driver: Arc<dyn SandboxDriver>,
        fabric: Arc<dyn BroadcastFabric>,
    ) -> Self {
        Self {
            repository,
            registry,
            driver,
            fabric,
        }
    }

    /// セッション終了を実行
    ///
    /// teardown の手順:
    /// 1. sandbox を停止・削除する（失敗はログに留め、終了処理は続行）
    /// 2. セッション状態をメモリから破棄する（未知のセッションは確定的な失敗）
    /// 3. end チャンネルへ終了通知を publish する
    pub async fn execute(&self, session_id: &SessionId, by: &UserId) -> Result<(), EndSessionError> {
        // 1. sandbox teardown（ハンドルは registry から取り除く）
        if let Some(entry) = self.registry.take(session_id).await {
            let mut handle = entry.lock().await;
            if matches!(
                handle.status,
                SandboxStatus::Created | SandboxStatus::Running | SandboxStatus::Stopped
            ) {
                if let Err(e) = self.driver.stop(&handle.name).await {
                    tracing::warn!("Failed to stop sandbox '{}' on teardown: {}", handle.name, e);
                }
                if let Err(e) = self.driver.remove(&handle.name).await {
                    tracing::warn!(
                        "Failed to remove sandbox '{}' on teardown: {}",
                        handle.name,
                        e
                    );
                }
            }
            handle.status = SandboxStatus::Removed;
        }

        // 2. セッション状態の破棄
        self.repository
            .remove(session_id)
            .await
            .map_err(|_| EndSessionError::SessionNotFound(session_id.as_str().to_string()))?;

        // 3. 終了通知
        let envelope = SessionEndMessage::ended(by.as_str().to_string());
        let key = ChannelKey::new(session_id.clone(), ChannelKind::End);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;

        Ok(())
    }
}
