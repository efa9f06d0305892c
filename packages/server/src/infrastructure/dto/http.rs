//! HTTP エンドポイントのリクエスト/レスポンス DTO

use serde::{Deserialize, Serialize};

/// POST /api/sessions/run/{sessionId} のリクエスト
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeRequest {
    pub language: String,
    pub code: String,
    pub user_id: String,
}

/// POST /api/sessions/run/{sessionId} のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCodeResponse {
    /// stdout + stderr の結合出力
    pub output: String,
}

/// POST /api/sessions/end/{sessionId} のリクエスト
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    /// セッションを終了させるユーザー
    pub by: String,
}

/// POST /api/sessions/leave/{sessionId} のリクエスト
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveSessionRequest {
    pub user_id: String,
}

/// GET /api/sessions/{sessionId} のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateDto {
    pub session_id: String,
    pub document: String,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// エラーレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
