//! Sandbox lifecycle のドメインモデルと trait 定義
//!
//! セッションは最大 1 つの外部実行 sandbox を持つ。sandbox の外部名は
//! sessionId から決定的に導出され、バックエンド再起動後も既存の
//! sandbox を再発見・再利用できる。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    error::SandboxError,
    model::{Language, SessionId},
};

/// sandbox のライフサイクル状態
///
/// `None → Created → Running → Stopped → Removed`（Removed は終端）。
/// Stopped からは再起動（start）で Running に戻れる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxStatus {
    /// まだ外部 sandbox が存在しない
    None,
    /// 作成済み・未起動
    Created,
    /// 実行中
    Running,
    /// 停止中（再起動可能）
    Stopped,
    /// 削除済み（終端）
    Removed,
}

/// セッションに紐づく sandbox のハンドル
#[derive(Debug, Clone)]
pub struct SandboxHandle {
    /// 外部 sandbox の名前（sessionId から決定的に導出）
    pub name: String,
    /// sandbox 作成時に固定される実行言語
    pub language: Option<Language>,
    pub status: SandboxStatus,
}

impl SandboxHandle {
    /// セッションに対応するハンドルを作成する（外部 sandbox は未作成）
    pub fn for_session(session_id: &SessionId) -> Self {
        Self {
            name: Self::sandbox_name(session_id),
            language: None,
            status: SandboxStatus::None,
        }
    }

    /// sessionId から外部 sandbox 名を導出する
    pub fn sandbox_name(session_id: &SessionId) -> String {
        format!("sandbox-{}", session_id.as_str())
    }
}

/// Sandbox driver trait
///
/// 外部実行環境のライフサイクル操作を抽象化する狭いインターフェース。
/// CLI に shell out する実装と API を直接呼ぶ実装を差し替えられるよう、
/// 状態機械（UseCase 層）から実行メカニズムを分離する。
///
/// create / start / stop はブロッキングで数秒かかりうる操作。呼び出し側は
/// ドキュメントロックや presence ロックを保持したまま呼んではならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SandboxDriver: Send + Sync {
    /// sandbox を作成する
    ///
    /// 同名の sandbox が既に存在する場合は成功として扱う
    /// （決定的な名前により再起動後の再利用を可能にするため）。
    async fn create(&self, name: &str, language: Language) -> Result<(), SandboxError>;

    /// sandbox を起動する
    async fn start(&self, name: &str) -> Result<(), SandboxError>;

    /// sandbox を停止する
    async fn stop(&self, name: &str) -> Result<(), SandboxError>;

    /// sandbox を削除する
    async fn remove(&self, name: &str) -> Result<(), SandboxError>;

    /// sandbox 内でコードを実行し、stdout + stderr の結合出力を返す
    async fn exec(&self, name: &str, language: Language, code: &str)
    -> Result<String, SandboxError>;
}

/// Sandbox registry trait
///
/// セッションごとのハンドルを保持する。各ハンドルは独立した Mutex で
/// 保護され、同一セッションのライフサイクル遷移を直列化しつつ、
/// 別セッションの sandbox 操作を並行に進められる。
#[async_trait]
pub trait SandboxRegistry: Send + Sync {
    /// セッションのハンドルを取得する（なければ未作成状態で登録）
    async fn entry(&self, session_id: &SessionId) -> Arc<Mutex<SandboxHandle>>;

    /// セッションのハンドルを取得する（なければ None）
    async fn get(&self, session_id: &SessionId) -> Option<Arc<Mutex<SandboxHandle>>>;

    /// セッションのハンドルを registry から取り除いて返す
    async fn take(&self, session_id: &SessionId) -> Option<Arc<Mutex<SandboxHandle>>>;
}
