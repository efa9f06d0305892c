//! UseCase: ドキュメント編集の適用
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ApplyEditUseCase::execute() メソッド
//! - 編集の受理（全文置換・バージョン採番）と edit チャンネルへの publish
//!
//! ### なぜこのテストが必要か
//! - ビジネスロジックの検証：受理された編集だけが broadcast される
//! - 本文欠落の編集が拒否され、現在の権威的状態が返ることを確認
//! - 永続化のスケジュールが編集の受理をブロックしないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：編集の受理・配信・永続化スケジュール
//! - 異常系：text 欠落による拒否（resync 用の現在状態を返す）
//! - エッジケース：未知のセッションへの最初の編集（遅延初期化）

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, DocumentArchiver, SessionId, SessionRepository,
    UserId,
};
use crate::infrastructure::dto::websocket::EditMessage;

/// 編集提出の処理結果
///
/// 拒否の場合、`text` / `version` は現在の権威的状態を指す
/// （クライアントの resync に使う）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub applied: bool,
    pub text: String,
    pub version: u64,
}

/// ドキュメント編集適用のユースケース
pub struct ApplyEditUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn SessionRepository>,
    /// DocumentArchiver（durable store への永続化の抽象化）
    archiver: Arc<dyn DocumentArchiver>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl ApplyEditUseCase {
    /// 新しい ApplyEditUseCase を作成
    pub fn new(
        repository: Arc<dyn SessionRepository>,
        archiver: Arc<dyn DocumentArchiver>,
        fabric: Arc<dyn BroadcastFabric>,
    ) -> Self {
        Self {
            repository,
            archiver,
            fabric,
        }
    }

    /// 編集適用を実行
    ///
    /// # Arguments
    ///
    /// * `session_id` - 対象セッション（未知なら遅延初期化される）
    /// * `user_id` - 編集者
    /// * `text` - 編集後のドキュメント全文。`None` は不正な提出として拒否
    ///
    /// # Returns
    ///
    /// * 受理時: `applied = true`、新しい本文とサーバー採番バージョン
    /// * 拒否時: `applied = false`、現在の権威的状態（resync 用）
    pub async fn execute(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        text: Option<String>,
    ) -> EditOutcome {
        // 1. 本文が欠落した提出は拒否し、現在状態を返す（クラッシュさせない）
        let Some(text) = text else {
            tracing::warn!(
                "Rejected edit without text: session_id={}, user_id={}",
                session_id.as_str(),
                user_id.as_str()
            );
            let snapshot = self.repository.snapshot(session_id).await;
            return EditOutcome {
                applied: false,
                text: snapshot.document,
                version: snapshot.version,
            };
        };

        // 2. Repository 経由で編集を適用（セッション単位で直列化される）
        let applied = self.repository.apply_edit(session_id, user_id, text).await;

        // 3. 永続化をスケジュールする（受理・配信をブロックしない）
        let archiver = Arc::clone(&self.archiver);
        let archive_session_id = session_id.clone();
        let archive_text = applied.text.clone();
        let archive_version = applied.version;
        tokio::spawn(async move {
            archiver
                .persist(&archive_session_id, &archive_text, archive_version)
                .await;
        });

        // 4. edit チャンネルへ publish（自インスタンス含む全購読者に届く）
        let envelope = EditMessage {
            session_id: session_id.as_str().to_string(),
            user_id: user_id.as_str().to_string(),
            text: applied.text.clone(),
            server_version: applied.version,
        };
        let key = ChannelKey::new(session_id.clone(), ChannelKind::Edit);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;

        EditOutcome {
            applied: true,
            text: applied.text,
            version: applied.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::{Mutex, Notify};

    use super::*;
    use crate::domain::SessionId;
    use crate::infrastructure::fabric::InProcessFabric;
    use crate::infrastructure::repository::InMemorySessionRepository;

    // 永続化呼び出しを記録する test double
    struct RecordingArchiver {
        records: Mutex<Vec<(String, String, u64)>>,
        notify: Notify,
    }

    impl RecordingArchiver {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                notify: Notify::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl DocumentArchiver for RecordingArchiver {
        async fn persist(&self, session_id: &SessionId, text: &str, version: u64) {
            self.records.lock().await.push((
                session_id.as_str().to_string(),
                text.to_string(),
                version,
            ));
            self.notify.notify_one();
        }
    }

    fn session_id(value: &str) -> SessionId {
        SessionId::new(value.to_string()).unwrap()
    }

    fn user_id(value: &str) -> UserId {
        UserId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_execute_applies_edit_and_publishes_envelope() {
        // テスト項目: 受理された編集が edit チャンネルへ publish される
        // given (前提条件):
        let repository = Arc::new(InMemorySessionRepository::new());
        let archiver = Arc::new(RecordingArchiver::new());
        let fabric = Arc::new(InProcessFabric::new());
        let usecase = ApplyEditUseCase::new(repository.clone(), archiver.clone(), fabric.clone());

        let sid = session_id("s1");
        let alice = user_id("alice");
        let key = ChannelKey::new(sid.clone(), ChannelKind::Edit);
        let mut rx = fabric.subscribe(&key).await;

        // when (操作):
        let outcome = usecase
            .execute(&sid, &alice, Some("print(1)".to_string()))
            .await;

        // then (期待する結果):
        assert!(outcome.applied);
        assert_eq!(outcome.text, "print(1)");
        assert_eq!(outcome.version, 1);

        let payload = rx.recv().await.unwrap();
        let envelope: EditMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(envelope.session_id, "s1");
        assert_eq!(envelope.user_id, "alice");
        assert_eq!(envelope.text, "print(1)");
        assert_eq!(envelope.server_version, 1);
    }

    #[tokio::test]
    async fn test_execute_schedules_persistence() {
        // テスト項目: 受理された編集の永続化がスケジュールされる
        // given (前提条件):
        let repository = Arc::new(InMemorySessionRepository::new());
        let archiver = Arc::new(RecordingArchiver::new());
        let fabric = Arc::new(InProcessFabric::new());
        let usecase = ApplyEditUseCase::new(repository, archiver.clone(), fabric);

        let sid = session_id("s1");
        let alice = user_id("alice");

        // when (操作):
        usecase
            .execute(&sid, &alice, Some("print(1)".to_string()))
            .await;

        // then (期待する結果): 永続化は非同期に完了する
        tokio::time::timeout(Duration::from_secs(1), archiver.notify.notified())
            .await
            .unwrap();
        let records = archiver.records.lock().await;
        assert_eq!(
            records.as_slice(),
            &[("s1".to_string(), "print(1)".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_execute_rejects_missing_text_with_current_state() {
        // テスト項目: text 欠落の編集は拒否され、現在の権威的状態が返る
        // given (前提条件):
        let repository = Arc::new(InMemorySessionRepository::new());
        let archiver = Arc::new(RecordingArchiver::new());
        let fabric = Arc::new(InProcessFabric::new());
        let usecase = ApplyEditUseCase::new(repository.clone(), archiver, fabric.clone());

        let sid = session_id("s1");
        let alice = user_id("alice");
        let key = ChannelKey::new(sid.clone(), ChannelKind::Edit);
        let mut rx = fabric.subscribe(&key).await;

        usecase
            .execute(&sid, &alice, Some("print(1)".to_string()))
            .await;
        rx.recv().await.unwrap();

        // when (操作): 本文のない提出
        let outcome = usecase.execute(&sid, &alice, None).await;

        // then (期待する結果): 拒否され、バージョンは進まず、何も publish されない
        assert!(!outcome.applied);
        assert_eq!(outcome.text, "print(1)");
        assert_eq!(outcome.version, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_execute_lazily_initializes_unknown_session() {
        // テスト項目: 未知のセッションへの最初の編集は遅延初期化のうえ受理される
        // given (前提条件):
        let repository = Arc::new(InMemorySessionRepository::new());
        let archiver = Arc::new(RecordingArchiver::new());
        let fabric = Arc::new(InProcessFabric::new());
        let usecase = ApplyEditUseCase::new(repository, archiver, fabric);

        // when (操作):
        let outcome = usecase
            .execute(
                &session_id("brand-new"),
                &user_id("alice"),
                Some("x = 1".to_string()),
            )
            .await;

        // then (期待する結果): バージョン 0 の空ドキュメントに適用され 1 になる
        assert!(outcome.applied);
        assert_eq!(outcome.version, 1);
    }
}
