use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use docket_core::error::CoreError;
use docket_core::rooms::Room;
use docket_db::repositories::EditRequestRepo;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::protocol::{may_join, ClientMessage, ServerMessage};

/// Query string for `/api/v1/ws`. Browsers cannot set headers on a
/// WebSocket upgrade, so the access token travels here.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// HTTP handler that authenticates the caller and upgrades to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<impl IntoResponse> {
    let token = params.token.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized("Missing token query parameter".into()))
    })?;
    let user = AuthUser::from_token(&token, &state.config.jwt)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Registers the connection, forwards queued frames to the sink on a
/// spawned task, and handles subscribe/unsubscribe frames until the client
/// goes away.
async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, "WebSocket connected");

    let ws_manager = state.ws_manager.clone();
    let mut rx = ws_manager.add(conn_id.clone(), user.user_id, user.role).await;

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let reply = handle_client_message(&state, &conn_id, &user, text.as_str()).await;
                reply_to(&state, &conn_id, &reply).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn handle_client_message(
    state: &AppState,
    conn_id: &str,
    user: &AuthUser,
    text: &str,
) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(_) => return ServerMessage::error("Unrecognised message"),
    };

    match message {
        ClientMessage::Subscribe { room: name } => {
            let Some(room) = Room::parse(&name) else {
                return ServerMessage::error(format!("Unknown room '{name}'"));
            };

            let requested_by = match room {
                Room::EditRequest(id) if !user.is_admin() => {
                    match EditRequestRepo::find_by_id(&state.pool, id).await {
                        Ok(request) => request.map(|r| r.requested_by_id),
                        Err(e) => {
                            tracing::warn!(conn_id, error = %e, "Subscription lookup failed");
                            return ServerMessage::error("Subscription failed");
                        }
                    }
                }
                _ => None,
            };

            if !may_join(&room, user.user_id, user.role, requested_by) {
                return ServerMessage::error(format!("Not allowed to join '{name}'"));
            }

            state.ws_manager.join(conn_id, room).await;
            tracing::debug!(conn_id, room = %room, "Joined room");
            ServerMessage::Subscribed { room: name }
        }
        ClientMessage::Unsubscribe { room: name } => {
            if let Some(room) = Room::parse(&name) {
                state.ws_manager.leave(conn_id, &room).await;
            }
            ServerMessage::Unsubscribed { room: name }
        }
    }
}

async fn reply_to(state: &AppState, conn_id: &str, reply: &ServerMessage) {
    match serde_json::to_string(reply) {
        Ok(json) => {
            state.ws_manager.send_to(conn_id, Message::Text(json.into())).await;
        }
        Err(e) => tracing::warn!(conn_id, error = %e, "Failed to encode WebSocket reply"),
    }
}
