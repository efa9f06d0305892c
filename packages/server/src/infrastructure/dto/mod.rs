//! ワイヤ上の DTO 定義
//!
//! すべてのペイロードはフィールドタグ付きの構造化 JSON であり、
//! 位置引数的な形式は使わない。

pub mod http;
pub mod websocket;
