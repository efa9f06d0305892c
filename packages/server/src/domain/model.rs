//! セッション同期のドメインモデル（値オブジェクト・エンティティ）

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// ID 文字列の共通検証
///
/// ID は pub/sub チャンネル名（`session-updates:<sessionId>` など）に
/// 埋め込まれるため、区切り文字と空白を禁止する。
fn validate_id(value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::EmptyId);
    }
    for c in value.chars() {
        if c == ':' || c == '/' || c.is_whitespace() {
            return Err(DomainError::InvalidIdCharacter(c));
        }
    }
    Ok(())
}

/// セッション ID（値オブジェクト）
///
/// 協調デバッグセッションを一意に識別する不透明な ID。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// 新しい SessionId を作成（検証付き）
    pub fn new(value: String) -> Result<Self, DomainError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// ユーザー ID（値オブジェクト）
///
/// 認証済みユーザーの識別子。トークン発行・検証は外部コラボレーターの責務。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// 新しい UserId を作成（検証付き）
    pub fn new(value: String) -> Result<Self, DomainError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// 接続 ID（値オブジェクト）
///
/// Connection Gateway がトランスポートリンクごとに採番する一時的な ID。
/// 1 ユーザーが同一セッションに複数接続を持つことがある。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// 新しい ConnectionId を作成（検証付き）
    pub fn new(value: String) -> Result<Self, DomainError> {
        validate_id(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ConnectionId のファクトリ
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// UUID v4 で ConnectionId を生成
    pub fn generate() -> ConnectionId {
        // uuid v4 は検証を通る文字のみで構成される
        ConnectionId(uuid::Uuid::new_v4().to_string())
    }
}

/// sandbox で実行可能な言語
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Java,
    Node,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Node => "node",
        }
    }

    /// sandbox のベースイメージ
    pub fn docker_image(&self) -> &'static str {
        match self {
            Language::Python => "python:3.11-slim",
            Language::Java => "openjdk:21-slim",
            Language::Node => "node:20-slim",
        }
    }

    /// 標準入力からコードを受け取って実行するコマンド
    pub fn exec_command(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["python", "-"],
            Language::Java => &["jshell", "-s", "-"],
            Language::Node => &["node", "-"],
        }
    }
}

impl TryFrom<&str> for Language {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "python" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "node" => Ok(Language::Node),
            other => Err(DomainError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// 受理された編集の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    /// 編集後のドキュメント全文
    pub text: String,
    /// 編集後のバージョン（1 編集ごとに +1）
    pub version: u64,
}

/// セッションの現在状態のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub document: String,
    pub version: u64,
    pub language: Option<Language>,
    pub last_edited_by: Option<UserId>,
}

/// セッションエンティティ
///
/// セッションごとの権威的なドキュメント本文とバージョンカウンター。
/// 編集はドキュメント全文置換であり、last-write-wins の既知の簡略化を
/// 意図的に維持している（真の競合解決を導入する場合はここで
/// クライアントバージョンとの比較・拒否を行う）。
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    document: String,
    version: u64,
    language: Option<Language>,
    last_edited_by: Option<UserId>,
}

impl Session {
    /// 新しいセッションを作成（空ドキュメント、バージョン 0）
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            document: String::new(),
            version: 0,
            language: None,
            last_edited_by: None,
        }
    }

    /// 編集を適用する
    ///
    /// ドキュメント全文を無条件に置き換え、バージョンをちょうど 1 進める。
    pub fn apply_edit(&mut self, user_id: &UserId, text: String) -> AppliedEdit {
        self.document = text;
        self.version += 1;
        self.last_edited_by = Some(user_id.clone());

        AppliedEdit {
            text: self.document.clone(),
            version: self.version,
        }
    }

    /// 実行言語を設定する
    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    /// 現在状態のスナップショットを取得する
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            document: self.document.clone(),
            version: self.version,
            language: self.language,
            last_edited_by: self.last_edited_by.clone(),
        }
    }
}
