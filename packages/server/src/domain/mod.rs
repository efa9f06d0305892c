//! Domain 層
//!
//! セッション同期のドメインモデル（値オブジェクト・エンティティ）と、
//! Infrastructure 層が実装するインターフェース（trait）を定義します。

mod channel;
mod error;
mod fabric;
mod model;
mod presence;
mod pusher;
mod repository;
mod sandbox;

pub use channel::{ChannelKey, ChannelKind};
pub use error::{DomainError, FabricError, MessagePushError, RepositoryError, SandboxError};
pub use fabric::BroadcastFabric;
pub use model::{
    AppliedEdit, ConnectionId, ConnectionIdFactory, Language, Session, SessionId, SessionSnapshot,
    UserId,
};
pub use presence::{Departure, PresenceRegistry};
pub use pusher::{ConnectionPusher, PusherChannel};
pub use repository::{DocumentArchiver, SessionRepository};
pub use sandbox::{SandboxDriver, SandboxHandle, SandboxRegistry, SandboxStatus};

#[cfg(test)]
pub use sandbox::MockSandboxDriver;
