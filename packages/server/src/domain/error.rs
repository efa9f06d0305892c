//! Domain 層のエラー型定義

use thiserror::Error;

/// 値オブジェクト生成時の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// ID が空文字列
    #[error("id must not be empty")]
    EmptyId,

    /// ID にチャンネル名として使用できない文字が含まれる
    #[error("id contains invalid character: '{0}'")]
    InvalidIdCharacter(char),

    /// 未対応の実行言語
    #[error("unsupported language: '{0}'")]
    UnsupportedLanguage(String),
}

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// セッションが存在しない
    #[error("session not found: '{0}'")]
    SessionNotFound(String),
}

/// クライアントへのメッセージ送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 接続が存在しない
    #[error("connection not found: '{0}'")]
    ConnectionNotFound(String),

    /// 送信チャンネルへの書き込み失敗
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Broadcast fabric の publish エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FabricError {
    /// fabric への書き込み失敗
    #[error("failed to publish to channel '{channel}': {reason}")]
    PublishFailed { channel: String, reason: String },
}

/// Sandbox driver のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// sandbox の作成失敗（リトライ可能）
    #[error("failed to create sandbox '{name}': {reason}")]
    CreateFailed { name: String, reason: String },

    /// sandbox の起動失敗
    #[error("failed to start sandbox '{name}': {reason}")]
    StartFailed { name: String, reason: String },

    /// sandbox の停止失敗
    #[error("failed to stop sandbox '{name}': {reason}")]
    StopFailed { name: String, reason: String },

    /// sandbox の削除失敗
    #[error("failed to remove sandbox '{name}': {reason}")]
    RemoveFailed { name: String, reason: String },

    /// sandbox 内でのコード実行失敗
    #[error("failed to exec in sandbox '{name}': {reason}")]
    ExecFailed { name: String, reason: String },
}
