//! UseCase: sandbox でのコード実行
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RunCodeUseCase::execute() メソッド
//! - sandbox ライフサイクルの状態機械（None → Created → Running）と
//!   実行出力の terminal チャンネルへの publish
//!
//! ### なぜこのテストが必要か
//! - 状態遷移の検証：存在しない sandbox は作成してから起動される
//! - 実行中の sandbox は再作成されず再利用される
//! - 作成失敗がリトライ可能なエラーとして呼び出し側へ返る
//!
//! ### どのような状況を想定しているか
//! - 正常系：初回実行（作成→起動→実行）、2 回目以降（実行のみ）
//! - 異常系：作成失敗・起動失敗
//! - エッジケース：停止済み sandbox の再起動

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, Language, SandboxDriver, SandboxRegistry,
    SandboxStatus, SessionId,
};
use crate::infrastructure::dto::websocket::TerminalMessage;

use super::error::RunCodeError;

/// コード実行のユースケース
pub struct RunCodeUseCase {
    /// SandboxRegistry（セッションごとのハンドル管理の抽象化）
    registry: Arc<dyn SandboxRegistry>,
    /// SandboxDriver（外部実行環境操作の抽象化）
    driver: Arc<dyn SandboxDriver>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl RunCodeUseCase {
    /// 新しい RunCodeUseCase を作成
    pub fn new(
        registry: Arc<dyn SandboxRegistry>,
        driver: Arc<dyn SandboxDriver>,
        fabric: Arc<dyn BroadcastFabric>,
    ) -> Self {
        Self {
            registry,
            driver,
            fabric,
        }
    }

    /// コード実行を実行
    ///
    /// sandbox が目的の状態になければライフサイクルを進めてから exec する。
    /// ハンドルのロックを実行完了まで保持し、同一セッションのライフサイクル
    /// 操作を直列化する（ドキュメントロックとは独立なので編集はブロック
    /// されない）。
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - stdout + stderr の結合出力（terminal へも publish 済み）
    /// * `Err(RunCodeError)` - ライフサイクル操作または実行の失敗
    pub async fn execute(
        &self,
        session_id: &SessionId,
        language: Language,
        code: &str,
    ) -> Result<String, RunCodeError> {
        let entry = self.registry.entry(session_id).await;
        let mut handle = entry.lock().await;

        // 1. 状態機械を Running まで進める
        match handle.status {
            SandboxStatus::None | SandboxStatus::Removed => {
                // 同名 sandbox が残っていれば driver 側で再利用される
                self.driver
                    .create(&handle.name, language)
                    .await
                    .map_err(RunCodeError::CreateFailed)?;
                handle.language = Some(language);
                handle.status = SandboxStatus::Created;

                self.driver
                    .start(&handle.name)
                    .await
                    .map_err(RunCodeError::StartFailed)?;
                handle.status = SandboxStatus::Running;
            }
            SandboxStatus::Created | SandboxStatus::Stopped => {
                self.driver
                    .start(&handle.name)
                    .await
                    .map_err(RunCodeError::StartFailed)?;
                handle.status = SandboxStatus::Running;
            }
            SandboxStatus::Running => {}
        }

        // 2. sandbox 作成時に固定された言語で実行する
        let exec_language = handle.language.unwrap_or(language);
        let output = self
            .driver
            .exec(&handle.name, exec_language, code)
            .await
            .map_err(RunCodeError::ExecFailed)?;

        // 3. 実行出力を terminal チャンネルへ publish
        let envelope = TerminalMessage {
            output: output.clone(),
        };
        let key = ChannelKey::new(session_id.clone(), ChannelKind::Terminal);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;

        Ok(output)
    }
}
