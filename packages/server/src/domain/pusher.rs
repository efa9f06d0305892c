//! ConnectionPusher trait 定義
//!
//! ローカルに接続中のクライアントへのメッセージ送信を抽象化します。
//! WebSocket の生成は UI 層の責務で、この trait は生成済みの
//! sender チャンネルを管理・使用するだけです。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, model::ConnectionId};

/// クライアントへのメッセージ送信用チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ConnectionPusher trait
#[async_trait]
pub trait ConnectionPusher: Send + Sync {
    /// 接続の sender を登録する
    async fn register_connection(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の sender を登録解除する（未知の接続は無視）
    async fn unregister_connection(&self, connection_id: &ConnectionId);

    /// 特定の接続にメッセージを送信する
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にメッセージを送信する（一部の失敗は許容し、ログに残す）
    async fn push_to_many(&self, targets: &[ConnectionId], content: &str);
}
