//! Infrastructure 層
//!
//! Domain 層が定義する trait の具体的な実装（インメモリ registry、
//! in-process broadcast fabric、docker CLI sandbox driver、
//! WebSocket pusher）と、ワイヤ上の DTO を提供します。

pub mod archive;
pub mod dto;
pub mod fabric;
pub mod message_pusher;
pub mod repository;
pub mod sandbox;
