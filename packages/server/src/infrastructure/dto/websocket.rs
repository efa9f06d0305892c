//! WebSocket / broadcast fabric 上のメッセージ DTO
//!
//! fabric に publish されるエンベロープのペイロードと、クライアントとの
//! 間でやり取りするフレームの両方をここに集約する（チャンネル命名と
//! デシリアライズを kind ごとに分散させないため）。

use serde::{Deserialize, Serialize};

/// クライアントから受信するフレーム（`type` タグ付き）
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// セッションの購読開始
    #[serde(rename_all = "camelCase")]
    Subscribe { session_id: String },

    /// セッションからの明示的な離脱（トランスポートは維持）
    #[serde(rename_all = "camelCase")]
    Unsubscribe { session_id: String },

    /// ドキュメント編集の提出
    #[serde(rename_all = "camelCase")]
    Edit {
        session_id: String,
        user_id: String,
        /// 欠落はバリデーションエラー（拒否して現在状態を返す）
        text: Option<String>,
        /// クライアント側バージョン。last-write-wins の簡略化により
        /// 現状は受理判定に使用しない
        client_version: Option<u64>,
    },

    /// チャットメッセージの送信
    #[serde(rename_all = "camelCase")]
    Chat {
        session_id: String,
        user_id: String,
        content: String,
    },
}

/// クライアントへ送信するフレーム
///
/// `topic` は `/topic/session/<sessionId>/<kind>` または
/// ユーザー宛て reply queue（`/queue/edits`）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFrame {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// 受理済み編集のエンベロープ（kind = edit）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessage {
    pub session_id: String,
    pub user_id: String,
    /// 編集後のドキュメント全文
    pub text: String,
    /// サーバーが採番した新バージョン
    pub server_version: u64,
}

/// 拒否された編集への resync 応答（reply queue で送信）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResponse {
    pub applied: bool,
    /// 現在の権威的なドキュメント全文
    pub updated_text: String,
    pub server_version: u64,
}

/// チャットメッセージのエンベロープ（kind = chat）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub session_id: String,
    pub user_id: String,
    pub content: String,
    /// Unix timestamp (milliseconds)
    pub timestamp: i64,
}

/// presence イベントの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceEventType {
    Joined,
    Left,
}

/// presence イベントのエンベロープ（kind = presence）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    pub r#type: PresenceEventType,
    pub user_id: String,
}

/// セッション終了のエンベロープ（kind = end）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndMessage {
    /// 常に "ended"
    pub r#type: String,
    /// セッションを終了させたユーザー
    pub by: String,
}

impl SessionEndMessage {
    pub fn ended(by: String) -> Self {
        Self {
            r#type: "ended".to_string(),
            by,
        }
    }
}

/// セッションメタデータのエンベロープ（kind = meta）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetaMessage {
    /// 常に "language"
    pub r#type: String,
    pub language: String,
    pub user_id: String,
    /// 遅れて購読したクライアントの同期用に最新コードを同梱する
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_code: Option<String>,
}

impl SessionMetaMessage {
    pub fn language(language: String, user_id: String, latest_code: Option<String>) -> Self {
        Self {
            r#type: "language".to_string(),
            language,
            user_id,
            latest_code,
        }
    }
}

/// sandbox 実行出力のエンベロープ（kind = terminal）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalMessage {
    /// stdout + stderr の結合出力
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_frame_edit_parses_camel_case_fields() {
        // テスト項目: edit フレームが camelCase のフィールド名でパースできる
        // given (前提条件):
        let json = r#"{"type":"edit","sessionId":"s1","userId":"alice","text":"print(1)","clientVersion":3}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        match frame {
            ClientFrame::Edit {
                session_id,
                user_id,
                text,
                client_version,
            } => {
                assert_eq!(session_id, "s1");
                assert_eq!(user_id, "alice");
                assert_eq!(text, Some("print(1)".to_string()));
                assert_eq!(client_version, Some(3));
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_client_frame_edit_allows_missing_text() {
        // テスト項目: text 欠落の edit フレームはパースは通る（拒否は UseCase 層）
        // given (前提条件):
        let json = r#"{"type":"edit","sessionId":"s1","userId":"alice"}"#;

        // when (操作):
        let frame: ClientFrame = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        match frame {
            ClientFrame::Edit { text, .. } => assert_eq!(text, None),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_presence_message_serializes_with_lowercase_type() {
        // テスト項目: presence イベントは {"type":"joined","userId":...} になる
        // given (前提条件):
        let message = PresenceMessage {
            r#type: PresenceEventType::Joined,
            user_id: "alice".to_string(),
        };

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        assert_eq!(json, r#"{"type":"joined","userId":"alice"}"#);
    }

    #[test]
    fn test_edit_message_roundtrip_carries_server_version() {
        // テスト項目: edit エンベロープは serverVersion を往復で保持する
        // given (前提条件):
        let message = EditMessage {
            session_id: "s1".to_string(),
            user_id: "alice".to_string(),
            text: "print(1)".to_string(),
            server_version: 7,
        };

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();
        let decoded: EditMessage = serde_json::from_str(&json).unwrap();

        // then (期待する結果):
        assert!(json.contains(r#""serverVersion":7"#));
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_session_meta_message_omits_absent_latest_code() {
        // テスト項目: latestCode が無い meta エンベロープはフィールド自体を省略する
        // given (前提条件):
        let message = SessionMetaMessage::language("python".to_string(), "alice".to_string(), None);

        // when (操作):
        let json = serde_json::to_string(&message).unwrap();

        // then (期待する結果):
        assert!(!json.contains("latestCode"));
    }
}
