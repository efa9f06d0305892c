//! Broadcast channel のキー定義
//!
//! チャンネル名は `(sessionId, kind)` から純粋に導出できる安定した契約であり、
//! どのバックエンドインスタンスも調整なしに同じ名前を構築できる。

use super::model::SessionId;

/// Broadcast channel の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// ドキュメント編集（受理済み、新バージョン付き）
    Edit,
    /// チャットメッセージ
    Chat,
    /// 参加者の joined / left イベント
    Presence,
    /// セッションメタデータ（言語変更など）
    Meta,
    /// sandbox 実行出力（stdout + stderr）
    Terminal,
    /// セッション終了通知
    End,
}

impl ChannelKind {
    /// 全種別（インスタンスはセッションごとに全種別を購読する）
    pub const ALL: [ChannelKind; 6] = [
        ChannelKind::Edit,
        ChannelKind::Chat,
        ChannelKind::Presence,
        ChannelKind::Meta,
        ChannelKind::Terminal,
        ChannelKind::End,
    ];

    /// pub/sub チャンネル名のプレフィックス
    pub fn channel_prefix(&self) -> &'static str {
        match self {
            ChannelKind::Edit => "session-updates",
            ChannelKind::Chat => "session-chat",
            ChannelKind::Presence => "session-presence",
            ChannelKind::Meta => "session-meta",
            ChannelKind::Terminal => "session-terminal",
            ChannelKind::End => "session-end",
        }
    }

    /// クライアント向けトピックパスの末尾セグメント
    pub fn topic_segment(&self) -> &'static str {
        match self {
            ChannelKind::Edit => "edits",
            ChannelKind::Chat => "chat",
            ChannelKind::Presence => "presence",
            ChannelKind::Meta => "meta",
            ChannelKind::Terminal => "terminal",
            ChannelKind::End => "end",
        }
    }

    /// プレフィックスから種別を逆引き
    pub fn from_channel_prefix(prefix: &str) -> Option<Self> {
        ChannelKind::ALL
            .into_iter()
            .find(|kind| kind.channel_prefix() == prefix)
    }
}

/// Broadcast channel のキー
///
/// `(sessionId, kind)` の組。pub/sub チャンネル名とクライアント向け
/// トピックパスの両方をここから導出する。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub session_id: SessionId,
    pub kind: ChannelKind,
}

impl ChannelKey {
    pub fn new(session_id: SessionId, kind: ChannelKind) -> Self {
        Self { session_id, kind }
    }

    /// pub/sub チャンネル名（`session-<kind>:<sessionId>`）
    pub fn channel_name(&self) -> String {
        format!("{}:{}", self.kind.channel_prefix(), self.session_id.as_str())
    }

    /// クライアント向けトピックパス（`/topic/session/<sessionId>/<kind>`）
    pub fn topic_path(&self) -> String {
        format!(
            "/topic/session/{}/{}",
            self.session_id.as_str(),
            self.kind.topic_segment()
        )
    }

    /// チャンネル名からキーを復元する
    pub fn parse(channel_name: &str) -> Option<Self> {
        let (prefix, session_id) = channel_name.split_once(':')?;
        let kind = ChannelKind::from_channel_prefix(prefix)?;
        let session_id = SessionId::new(session_id.to_string()).ok()?;
        Some(Self { session_id, kind })
    }
}
