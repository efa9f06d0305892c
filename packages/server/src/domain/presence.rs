//! Presence Registry trait 定義
//!
//! 接続（ConnectionId）とユーザー・セッションの対応を管理し、
//! joined / left イベントの導出に必要な情報を提供します。
//! presence は保存されず、接続マップから常に計算で導出する
//! （同一ユーザーの複数接続を二重カウントしないため）。

use async_trait::async_trait;

use super::model::{ConnectionId, SessionId, UserId};

/// あるセッションからユーザーが退出したことを表す導出イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    pub user_id: UserId,
}

/// Presence Registry trait
///
/// ## 並行性の契約
///
/// - セッション単位・接続単位の更新は実装側で排他される
/// - 未知の ConnectionId に対する操作は黙って無視される（エラーではない）
/// - 切断通知は再配送されうるため、すべての操作は冪等
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// 接続をセッションに登録する
    ///
    /// 戻り値はそのユーザーにとってこのセッションでの **最初の** 接続で
    /// あったかどうか。true のときのみ `joined` を配信する（冪等 join）。
    async fn register(
        &self,
        session_id: &SessionId,
        connection_id: &ConnectionId,
        user_id: &UserId,
    ) -> bool;

    /// 接続を削除し、結果として退出となる (session, user) の組を返す
    ///
    /// 切断イベントは ConnectionId しか持たないため、所属セッションと
    /// ユーザーはここで逆引きする。同一ユーザーの別接続が残っている
    /// セッションは退出に含まれない。
    async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<Departure>;

    /// セッションを購読中のローカル接続をすべて返す
    async fn local_connections(&self, session_id: &SessionId) -> Vec<ConnectionId>;

    /// ユーザーが保持するローカル接続をすべて返す（reply queue の宛先解決用）
    async fn user_connections(&self, user_id: &UserId) -> Vec<ConnectionId>;

    /// セッションにローカルの購読者が存在するか
    async fn has_local_interest(&self, session_id: &SessionId) -> bool;
}
