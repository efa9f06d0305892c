//! SandboxDriver 実装

mod docker;

pub use docker::DockerCliSandboxDriver;
