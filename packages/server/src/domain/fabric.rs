//! Broadcast fabric trait 定義
//!
//! `(sessionId, kind)` をキーとする publish/subscribe の抽象。
//! あるインスタンスが publish したエンベロープは、同じチャンネルキーを
//! 購読するすべてのインスタンス（送信元自身を含む）に配送される。

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{channel::ChannelKey, error::FabricError};

/// Broadcast fabric trait
///
/// ## 配送の契約
///
/// - at-least-once 配送
/// - 同一チャンネルキー内の順序は publish 順（チャンネル間の順序保証はない）
/// - 送信元インスタンスにも必ず自己配送される
#[async_trait]
pub trait BroadcastFabric: Send + Sync {
    /// エンベロープを publish する
    async fn publish(&self, key: &ChannelKey, payload: String) -> Result<(), FabricError>;

    /// チャンネルキーの購読を開始し、受信用の receiver を返す
    ///
    /// 購読開始以降に publish されたエンベロープのみが届く。
    async fn subscribe(&self, key: &ChannelKey) -> broadcast::Receiver<String>;
}
