//! Shared utilities for the tsudoi collaborative debug session server.
//!
//! This crate provides logging setup and time utilities used by both the
//! server binary and its tests.

pub mod logger;
pub mod time;
