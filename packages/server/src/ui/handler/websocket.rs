//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, SessionId, UserId},
    infrastructure::dto::websocket::{ClientFrame, EditResponse, ServerFrame, SessionMetaMessage},
    ui::state::AppState,
};

/// Reply queue topic for user-addressed edit responses
const REPLY_QUEUE_TOPIC: &str = "/queue/edits";

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> UserId (Domain Model)
    let user_id = match UserId::try_from(query.user_id.clone()) {
        Ok(id) => id,
        Err(_) => {
            tracing::warn!("Invalid user_id format: '{}'", query.user_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Assign a transport-scoped connection id; one user may hold several
    let connection_id = ConnectionIdFactory::generate();

    // Create a channel for this connection to receive fan-out frames
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .pusher
        .register_connection(connection_id.clone(), tx)
        .await;

    tracing::info!(
        "User '{}' connected with connection '{}'",
        user_id.as_str(),
        connection_id.as_str()
    );
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, connection_id, rx)))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// This handles the outbound flow: fan-out frames from the session relay
/// (via rx channel) are sent to this connection.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    user_id: UserId,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let state_clone = state.clone();
    let user_id_clone = user_id.clone();
    let connection_id_clone = connection_id.clone();

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let frame = match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            // 解釈できないフレームは落とす（接続は維持）
                            tracing::warn!("Failed to parse client frame: {}", e);
                            continue;
                        }
                    };
                    handle_frame(&state_clone, &user_id_clone, &connection_id_clone, frame).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!(
                        "Connection '{}' requested close",
                        connection_id_clone.as_str()
                    );
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to push fan-out frames to this connection
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Transport closed: derive departures and publish `left` where due
    let departures = state
        .disconnect_connection_usecase
        .execute(&connection_id)
        .await;
    tracing::info!(
        "Connection '{}' of user '{}' disconnected ({} departure(s))",
        connection_id.as_str(),
        user_id.as_str(),
        departures.len()
    );

    // ローカル購読者が残っていないセッションの購読を解放する
    for departure in departures {
        if !state
            .presence
            .has_local_interest(&departure.session_id)
            .await
        {
            state.relay.release_session(&departure.session_id).await;
        }
    }
}

async fn handle_frame(
    state: &Arc<AppState>,
    user_id: &UserId,
    connection_id: &ConnectionId,
    frame: ClientFrame,
) {
    match frame {
        ClientFrame::Subscribe { session_id } => {
            let Some(session_id) = parse_session_id(&session_id) else {
                return;
            };

            // 購読者自身の joined を取りこぼさないよう、relay の購読を先に張る
            state.relay.ensure_session(&session_id).await;
            state
                .subscribe_session_usecase
                .execute(&session_id, connection_id, user_id)
                .await;

            send_snapshot(state, &session_id, connection_id).await;
        }
        ClientFrame::Unsubscribe { session_id } => {
            let Some(session_id) = parse_session_id(&session_id) else {
                return;
            };
            state
                .leave_session_usecase
                .execute(&session_id, user_id)
                .await;
        }
        ClientFrame::Edit {
            session_id,
            user_id: editor,
            text,
            client_version: _,
        } => {
            let Some(session_id) = parse_session_id(&session_id) else {
                return;
            };
            let Ok(editor) = UserId::try_from(editor.clone()) else {
                tracing::warn!("Invalid user_id format in edit frame: '{}'", editor);
                return;
            };

            let outcome = state
                .apply_edit_usecase
                .execute(&session_id, &editor, text)
                .await;

            // 拒否された編集は編集者の全接続へ resync 応答を返す
            if !outcome.applied {
                let response = EditResponse {
                    applied: false,
                    updated_text: outcome.text,
                    server_version: outcome.version,
                };
                let Some(json) = encode_frame(REPLY_QUEUE_TOPIC.to_string(), &response) else {
                    return;
                };
                let targets = state.presence.user_connections(&editor).await;
                state.pusher.push_to_many(&targets, &json).await;
            }
        }
        ClientFrame::Chat {
            session_id,
            user_id: _,
            content,
        } => {
            let Some(session_id) = parse_session_id(&session_id) else {
                return;
            };
            // 送信者は接続の認証済みユーザーで上書きする
            state
                .send_chat_usecase
                .execute(&session_id, user_id, content)
                .await;
        }
    }
}

/// Send the authoritative session state to a newly subscribed connection.
///
/// The document goes over the reply queue so the editor can initialize, and
/// the language (when already chosen) goes as a meta frame.
async fn send_snapshot(state: &Arc<AppState>, session_id: &SessionId, connection_id: &ConnectionId) {
    let snapshot = state.repository.snapshot(session_id).await;

    let resync = EditResponse {
        applied: true,
        updated_text: snapshot.document.clone(),
        server_version: snapshot.version,
    };
    if let Some(json) = encode_frame(REPLY_QUEUE_TOPIC.to_string(), &resync) {
        if let Err(e) = state.pusher.push_to(connection_id, &json).await {
            tracing::warn!(
                "Failed to send snapshot to '{}': {}",
                connection_id.as_str(),
                e
            );
            return;
        }
    }

    if let Some(language) = snapshot.language {
        let meta = SessionMetaMessage::language(
            language.as_str().to_string(),
            snapshot
                .last_edited_by
                .map(|u| u.as_str().to_string())
                .unwrap_or_default(),
            None,
        );
        let topic = crate::domain::ChannelKey::new(
            session_id.clone(),
            crate::domain::ChannelKind::Meta,
        )
        .topic_path();
        if let Some(json) = encode_frame(topic, &meta) {
            if let Err(e) = state.pusher.push_to(connection_id, &json).await {
                tracing::warn!(
                    "Failed to send meta snapshot to '{}': {}",
                    connection_id.as_str(),
                    e
                );
            }
        }
    }
}

fn parse_session_id(raw: &str) -> Option<SessionId> {
    match SessionId::new(raw.to_string()) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!("Invalid session_id format '{}': {}", raw, e);
            None
        }
    }
}

fn encode_frame<T: Serialize>(topic: String, payload: &T) -> Option<String> {
    let value = match serde_json::to_value(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to encode frame payload: {}", e);
            return None;
        }
    };
    match serde_json::to_string(&ServerFrame {
        topic,
        payload: value,
    }) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!("Failed to encode frame: {}", e);
            None
        }
    }
}
