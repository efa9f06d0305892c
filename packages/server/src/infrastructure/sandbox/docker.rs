//! docker CLI に shell out する SandboxDriver 実装
//!
//! コンテナ名は sessionId から決定的に導出された名前をそのまま使う。
//! create 時の「既に存在する」衝突は成功として扱い、バックエンド再起動後に
//! 既存コンテナを再利用できるようにする。コードの実行はコンテナ内の
//! インタープリタに標準入力経由でコードを渡し、stdout と stderr の
//! 結合出力を返す。

use std::process::Stdio;

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};

use crate::domain::{Language, SandboxDriver, SandboxError};

/// docker CLI を使った SandboxDriver 実装
pub struct DockerCliSandboxDriver {
    /// docker バイナリのパス（通常は "docker"）
    docker_bin: String,
}

impl DockerCliSandboxDriver {
    /// 新しい DockerCliSandboxDriver を作成
    pub fn new() -> Self {
        Self::with_binary("docker".to_string())
    }

    /// docker バイナリのパスを指定して作成
    pub fn with_binary(docker_bin: String) -> Self {
        Self { docker_bin }
    }

    /// docker サブコマンドを実行して (成功, stdout, stderr) を返す
    async fn run_docker(&self, args: &[&str]) -> Result<(bool, String, String), std::io::Error> {
        let output = Command::new(&self.docker_bin)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;
        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

impl Default for DockerCliSandboxDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SandboxDriver for DockerCliSandboxDriver {
    async fn create(&self, name: &str, language: Language) -> Result<(), SandboxError> {
        // コンテナはアイドルプロセスで常駐させ、実行は exec で行う
        let args = [
            "create",
            "--name",
            name,
            language.docker_image(),
            "tail",
            "-f",
            "/dev/null",
        ];
        let (success, _, stderr) =
            self.run_docker(&args)
                .await
                .map_err(|e| SandboxError::CreateFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;

        if success {
            tracing::info!("Created sandbox container '{}'", name);
            return Ok(());
        }

        // 決定的な名前による衝突は再利用として成功扱い
        if stderr.contains("is already in use") || stderr.contains("Conflict") {
            tracing::info!("Sandbox container '{}' already exists, reusing", name);
            return Ok(());
        }

        Err(SandboxError::CreateFailed {
            name: name.to_string(),
            reason: stderr.trim().to_string(),
        })
    }

    async fn start(&self, name: &str) -> Result<(), SandboxError> {
        let (success, _, stderr) = self.run_docker(&["start", name]).await.map_err(|e| {
            SandboxError::StartFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        if success {
            tracing::info!("Started sandbox container '{}'", name);
            Ok(())
        } else {
            Err(SandboxError::StartFailed {
                name: name.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn stop(&self, name: &str) -> Result<(), SandboxError> {
        let (success, _, stderr) = self.run_docker(&["stop", name]).await.map_err(|e| {
            SandboxError::StopFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        if success {
            tracing::info!("Stopped sandbox container '{}'", name);
            Ok(())
        } else {
            Err(SandboxError::StopFailed {
                name: name.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn remove(&self, name: &str) -> Result<(), SandboxError> {
        let (success, _, stderr) = self.run_docker(&["rm", "-f", name]).await.map_err(|e| {
            SandboxError::RemoveFailed {
                name: name.to_string(),
                reason: e.to_string(),
            }
        })?;

        if success {
            tracing::info!("Removed sandbox container '{}'", name);
            Ok(())
        } else {
            Err(SandboxError::RemoveFailed {
                name: name.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn exec(
        &self,
        name: &str,
        language: Language,
        code: &str,
    ) -> Result<String, SandboxError> {
        let mut args = vec!["exec", "-i", name];
        args.extend_from_slice(language.exec_command());

        let mut child = Command::new(&self.docker_bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SandboxError::ExecFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        // コードは標準入力経由でインタープリタに渡す
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(code.as_bytes())
                .await
                .map_err(|e| SandboxError::ExecFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            // EOF を送るために stdin を閉じる
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| SandboxError::ExecFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        // ユーザーコードの実行時エラーは terminal 出力の一部であり、
        // driver のエラーではない。stdout と stderr を結合して返す。
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }
}
