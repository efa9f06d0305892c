//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    error::RepositoryError,
    model::{AppliedEdit, Language, SessionId, SessionSnapshot, UserId},
};

/// Session Repository trait
///
/// セッションごとの権威的なドキュメント状態へのインターフェース。
///
/// ## 並行性の契約
///
/// - 同一セッションへの変更操作は実装側で直列化される（セッション単位の排他）
/// - 異なるセッションへの操作は互いにブロックしない
/// - 未知のセッションへの最初の参照は遅延初期化される（エラーではない）
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 編集を適用する（全文置換・バージョン +1）
    ///
    /// 未知のセッションは空ドキュメント・バージョン 0 で遅延初期化してから
    /// 適用する。受理可否の判定（text の欠落など）は UseCase 層の責務。
    async fn apply_edit(
        &self,
        session_id: &SessionId,
        user_id: &UserId,
        text: String,
    ) -> AppliedEdit;

    /// セッションの現在状態のスナップショットを取得する（遅延初期化あり）
    async fn snapshot(&self, session_id: &SessionId) -> SessionSnapshot;

    /// 実行言語を設定する（遅延初期化あり）
    async fn set_language(&self, session_id: &SessionId, language: Language);

    /// セッションをメモリから破棄する
    ///
    /// 永続化レイヤーに残る記録とは独立。存在しない場合はエラー。
    async fn remove(&self, session_id: &SessionId) -> Result<(), RepositoryError>;

    /// セッションが存在するか
    async fn exists(&self, session_id: &SessionId) -> bool;
}

/// ドキュメント永続化の外部コラボレーター
///
/// 受理された編集は durable store への永続化がスケジュールされる。
/// 実装（RDB など）はこの core の範囲外であり、trait のみを契約とする。
#[async_trait]
pub trait DocumentArchiver: Send + Sync {
    /// 新しいドキュメント本文の永続化を行う
    async fn persist(&self, session_id: &SessionId, text: &str, version: u64);
}
