//! UseCase 層のエラー型定義

use thiserror::Error;

use crate::domain::SandboxError;

/// コード実行のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunCodeError {
    /// sandbox の作成失敗（呼び出し側でリトライ可能）
    #[error("failed to create sandbox: {0}")]
    CreateFailed(SandboxError),

    /// sandbox の起動失敗
    #[error("failed to start sandbox: {0}")]
    StartFailed(SandboxError),

    /// sandbox 内でのコード実行失敗
    #[error("failed to execute code: {0}")]
    ExecFailed(SandboxError),
}

/// セッション終了のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndSessionError {
    /// セッションが存在しない（確定的な失敗、リトライしない）
    #[error("session not found: '{0}'")]
    SessionNotFound(String),
}
