//! UseCase: sandbox の停止
//!
//! ベストエフォートの停止。driver の失敗はログに留めて伝播させず、
//! sandbox が存在しない場合も含めて必ず terminal チャンネルへ停止通知を
//! publish する（UI の表示を一貫させるため）。

use std::sync::Arc;

use crate::domain::{
    BroadcastFabric, ChannelKey, ChannelKind, SandboxDriver, SandboxRegistry, SandboxStatus,
    SessionId,
};
use crate::infrastructure::dto::websocket::TerminalMessage;

/// 停止通知としてクライアントへ流す出力
const STOP_NOTICE: &str = "Sandbox stopped.\n";

/// sandbox 停止のユースケース
pub struct StopSandboxUseCase {
    /// SandboxRegistry（セッションごとのハンドル管理の抽象化）
    registry: Arc<dyn SandboxRegistry>,
    /// SandboxDriver（外部実行環境操作の抽象化）
    driver: Arc<dyn SandboxDriver>,
    /// BroadcastFabric（インスタンス間 publish/subscribe の抽象化）
    fabric: Arc<dyn BroadcastFabric>,
}

impl StopSandboxUseCase {
    /// 新しい StopSandboxUseCase を作成
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

    /// 停止を実行（失敗しない）
    pub async fn execute(&self, session_id: &SessionId) {
        if let Some(entry) = self.registry.get(session_id).await {
            let mut handle = entry.lock().await;
            match handle.status {
                SandboxStatus::Created | SandboxStatus::Running => {
                    if let Err(e) = self.driver.stop(&handle.name).await {
                        tracing::warn!("Failed to stop sandbox '{}': {}", handle.name, e);
                    }
                    handle.status = SandboxStatus::Stopped;
                }
                SandboxStatus::None | SandboxStatus::Stopped | SandboxStatus::Removed => {}
            }
        }

        let envelope = TerminalMessage {
            output: STOP_NOTICE.to_string(),
        };
        let key = ChannelKey::new(session_id.clone(), ChannelKind::Terminal);
        super::publish_envelope(self.fabric.as_ref(), &key, &envelope).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Language, MockSandboxDriver, SandboxError};
    use crate::infrastructure::fabric::InProcessFabric;
    use crate::infrastructure::repository::InMemorySandboxRegistry;

    fn session_id(value: &str) -> SessionId {
        SessionId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_running_sandbox_is_stopped_and_notice_published() {
        // テスト項目: 実行中の sandbox が停止され、停止通知が publish される
        // given (前提条件):
        let registry = Arc::new(InMemorySandboxRegistry::new());
        let fabric = Arc::new(InProcessFabric::new());
        let sid = session_id("s1");

        {
            let entry = registry.entry(&sid).await;
            let mut handle = entry.lock().await;
            handle.language = Some(Language::Python);
            handle.status = SandboxStatus::Running;
        }

        let mut driver = MockSandboxDriver::new();
        driver
            .expect_stop()
            .withf(|name| name == "sandbox-s1")
            .times(1)
            .returning(|_| Ok(()));

        let usecase = StopSandboxUseCase::new(registry.clone(), Arc::new(driver), fabric.clone());

        let key = ChannelKey::new(sid.clone(), ChannelKind::Terminal);
        let mut rx = fabric.subscribe(&key).await;

        // when (操作):
        usecase.execute(&sid).await;

        // then (期待する結果):
        let handle = registry.get(&sid).await.unwrap();
        assert_eq!(handle.lock().await.status, SandboxStatus::Stopped);

        let payload = rx.recv().await.unwrap();
        let envelope: TerminalMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(envelope.output, STOP_NOTICE);
    }

    #[tokio::test]
    async fn test_stop_without_sandbox_still_publishes_notice() {
        // テスト項目: sandbox が存在しなくても停止通知は publish される
        // given (前提条件):
        let registry = Arc::new(InMemorySandboxRegistry::new());
        let fabric = Arc::new(InProcessFabric::new());
        let mut driver = MockSandboxDriver::new();
        driver.expect_stop().times(0);

        let usecase = StopSandboxUseCase::new(registry, Arc::new(driver), fabric.clone());

        let sid = session_id("s1");
        let key = ChannelKey::new(sid.clone(), ChannelKind::Terminal);
        let mut rx = fabric.subscribe(&key).await;

        // when (操作):
        usecase.execute(&sid).await;

        // then (期待する結果):
        let payload = rx.recv().await.unwrap();
        let envelope: TerminalMessage = serde_json::from_str(&payload).unwrap();
        assert_eq!(envelope.output, STOP_NOTICE);
    }

    #[tokio::test]
    async fn test_driver_failure_is_swallowed() {
        // テスト項目: driver の停止失敗は伝播せず、状態は Stopped になる
        // given (前提条件):
        let registry = Arc::new(InMemorySandboxRegistry::new());
        let fabric = Arc::new(InProcessFabric::new());
        let sid = session_id("s1");

        {
            let entry = registry.entry(&sid).await;
            entry.lock().await.status = SandboxStatus::Running;
        }

        let mut driver = MockSandboxDriver::new();
        driver.expect_stop().times(1).returning(|name| {
            Err(SandboxError::StopFailed {
                name: name.to_string(),
                reason: "daemon unavailable".to_string(),
            })
        });

        let usecase = StopSandboxUseCase::new(registry.clone(), Arc::new(driver), fabric);

        // when (操作):
        usecase.execute(&sid).await;

        // then (期待する結果):
        let handle = registry.get(&sid).await.unwrap();
        assert_eq!(handle.lock().await.status, SandboxStatus::Stopped);
    }
}
