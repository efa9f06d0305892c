//! Broadcast fabric 実装

mod inprocess;

pub use inprocess::InProcessFabric;
