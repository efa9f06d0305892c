//! In-process broadcast fabric 実装
//!
//! チャンネルキーごとに tokio の broadcast channel を 1 本持ち、
//! publish されたエンベロープをすべての購読者（publish したインスタンス
//! 自身を含む）に配送する。複数のバックエンドインスタンスが同じ
//! `Arc<InProcessFabric>` を共有すれば、外部 broker（Redis pub/sub など）と
//! 同じ配送セマンティクスをプロセス内で再現できる。外部 broker を使う
//! 実装は BroadcastFabric trait の別実装として差し替える。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use crate::domain::{BroadcastFabric, ChannelKey, FabricError};

/// 受信側が 1 チャンネルあたりバッファできるエンベロープ数。
/// 溢れた遅い購読者はメッセージを取りこぼす（at-least-once は
/// 追いついている購読者に対する保証）。
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// In-process broadcast fabric
pub struct InProcessFabric {
    /// チャンネル名 → broadcast sender
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
    capacity: usize,
}

impl InProcessFabric {
    /// 新しい InProcessFabric を作成
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// バッファ容量を指定して作成
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// チャンネルの sender を取得する（なければ作成）
    async fn sender(&self, key: &ChannelKey) -> broadcast::Sender<String> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(key.channel_name())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for InProcessFabric {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BroadcastFabric for InProcessFabric {
    async fn publish(&self, key: &ChannelKey, payload: String) -> Result<(), FabricError> {
        let sender = self.sender(key).await;
        // 購読者ゼロの send はエラーを返すが、配送先がないだけで
        // fabric としては正常（後から購読したインスタンスには届かない）
        match sender.send(payload) {
            Ok(receiver_count) => {
                tracing::debug!(
                    "Published envelope to '{}' ({} receivers)",
                    key.channel_name(),
                    receiver_count
                );
                Ok(())
            }
            Err(_) => {
                tracing::debug!(
                    "Published envelope to '{}' with no subscribers",
                    key.channel_name()
                );
                Ok(())
            }
        }
    }

    async fn subscribe(&self, key: &ChannelKey) -> broadcast::Receiver<String> {
        let sender = self.sender(key).await;
        sender.subscribe()
    }
}
