//! Collaborative debug session backend library.
//!
//! This library keeps shared code sessions in sync across WebSocket clients:
//! whole-document edits with server-side versioning, presence tracking,
//! chat relay and per-session execution sandboxes, all fanned out through a
//! broadcast fabric so multiple backend instances stay consistent.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
