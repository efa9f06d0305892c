//! ログ出力のみを行う DocumentArchiver 実装
//!
//! durable store（RDB など）への永続化は外部コラボレーターの責務であり、
//! この core には含まれない。この実装は永続化がスケジュールされたことを
//! 観測可能にするだけのスタンドイン。

use async_trait::async_trait;

use crate::domain::{DocumentArchiver, SessionId};

/// 永続化リクエストをログに記録する DocumentArchiver 実装
pub struct LoggingArchiver;

#[async_trait]
impl DocumentArchiver for LoggingArchiver {
    async fn persist(&self, session_id: &SessionId, text: &str, version: u64) {
        tracing::debug!(
            "Scheduled persistence for session '{}' (version {}, {} bytes)",
            session_id.as_str(),
            version,
            text.len()
        );
    }
}
