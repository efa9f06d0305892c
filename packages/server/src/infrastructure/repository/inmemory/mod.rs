//! InMemory Repository 実装

mod presence;
mod sandbox;
mod session;

pub use presence::InMemoryPresenceRegistry;
pub use sandbox::InMemorySandboxRegistry;
pub use session::InMemorySessionRepository;
