//! Connection gateway: WebSocket endpoint, HTTP API and session fan-out.

mod handler;
mod relay;
mod server;
mod signal;
pub mod state; // UseCase 層からアクセスするため public に変更

pub use relay::SessionRelay;
pub use server::{Server, router};
