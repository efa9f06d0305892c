//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::{ConnectionPusher, PresenceRegistry, SessionRepository};
use crate::usecase::{
    ApplyEditUseCase, DisconnectConnectionUseCase, EndSessionUseCase, LeaveSessionUseCase,
    RunCodeUseCase, SendChatUseCase, StopSandboxUseCase, SubscribeSessionUseCase,
    UpdateSessionMetaUseCase,
};

use super::relay::SessionRelay;

/// Shared application state
pub struct AppState {
    /// ApplyEditUseCase（編集適用のユースケース）
    pub apply_edit_usecase: Arc<ApplyEditUseCase>,
    /// SubscribeSessionUseCase（購読開始のユースケース）
    pub subscribe_session_usecase: Arc<SubscribeSessionUseCase>,
    /// DisconnectConnectionUseCase（切断処理のユースケース）
    pub disconnect_connection_usecase: Arc<DisconnectConnectionUseCase>,
    /// LeaveSessionUseCase（明示的離脱のユースケース）
    pub leave_session_usecase: Arc<LeaveSessionUseCase>,
    /// SendChatUseCase（チャット中継のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
    /// UpdateSessionMetaUseCase（メタデータ更新のユースケース）
    pub update_meta_usecase: Arc<UpdateSessionMetaUseCase>,
    /// RunCodeUseCase（コード実行のユースケース）
    pub run_code_usecase: Arc<RunCodeUseCase>,
    /// StopSandboxUseCase（sandbox 停止のユースケース）
    pub stop_sandbox_usecase: Arc<StopSandboxUseCase>,
    /// EndSessionUseCase（セッション終了のユースケース）
    pub end_session_usecase: Arc<EndSessionUseCase>,
    /// Repository（データアクセス層の抽象化）
    pub repository: Arc<dyn SessionRepository>,
    /// PresenceRegistry（接続と在席管理の抽象化）
    pub presence: Arc<dyn PresenceRegistry>,
    /// ConnectionPusher（クライアントへの送信チャンネル管理の抽象化）
    pub pusher: Arc<dyn ConnectionPusher>,
    /// SessionRelay（fabric からローカル接続への fan-out）
    pub relay: Arc<SessionRelay>,
}
