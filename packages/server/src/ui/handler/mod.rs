//! HTTP / WebSocket endpoint handlers.

mod http;
mod websocket;

pub use http::{
    end_session, get_session_state, health_check, leave_session, run_code, stop_sandbox,
};
pub use websocket::websocket_handler;
