//! UseCase 層
//!
//! 1 操作 = 1 UseCase。Domain 層の trait にのみ依存し、
//! Infrastructure 層の具体的な実装には依存しない。

use serde::Serialize;

use crate::domain::{BroadcastFabric, ChannelKey};

mod apply_edit;
mod disconnect_connection;
mod end_session;
mod error;
mod leave_session;
mod run_code;
mod send_chat;
mod stop_sandbox;
mod subscribe_session;
mod update_meta;

pub use apply_edit::{ApplyEditUseCase, EditOutcome};
pub use disconnect_connection::DisconnectConnectionUseCase;
pub use end_session::EndSessionUseCase;
pub use error::{EndSessionError, RunCodeError};
pub use leave_session::LeaveSessionUseCase;
pub use run_code::RunCodeUseCase;
pub use send_chat::SendChatUseCase;
pub use stop_sandbox::StopSandboxUseCase;
pub use subscribe_session::SubscribeSessionUseCase;
pub use update_meta::UpdateSessionMetaUseCase;

/// エンベロープを JSON 化して fabric へ publish する共通処理
///
/// 配信は at-least-once のベストエフォートであり、publish 失敗は
/// 呼び出し元の操作を失敗させず、警告ログに留める。
pub(crate) async fn publish_envelope<T: Serialize>(
    fabric: &dyn BroadcastFabric,
    key: &ChannelKey,
    envelope: &T,
) {
    let payload = match serde_json::to_string(envelope) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(
                "Failed to serialize envelope for channel '{}': {}",
                key.channel_name(),
                e
            );
            return;
        }
    };
    if let Err(e) = fabric.publish(key, payload).await {
        tracing::warn!("Failed to publish envelope: {}", e);
    }
}
