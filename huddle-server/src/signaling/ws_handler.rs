use crate::room::{ParticipantConnection, RoomCommand};
use crate::signaling::SignalingService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use huddle_core::{ParticipantId, RoomId, SignalMessage};
use tracing::{debug, error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(service): State<SignalingService>,
) -> Response {
    let room_id = RoomId::from(room_id);

    if service.lookup_room(&room_id).await.is_none() {
        warn!(room = %room_id, "Refusing signaling for inactive room");
        return (StatusCode::NOT_FOUND, "room is not active").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, service))
}

async fn handle_socket(socket: WebSocket, room_id: RoomId, service: SignalingService) {
    info!(room = %room_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (connection, mut rx) = ParticipantConnection::channel();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize signal message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut joined: Option<ParticipantId> = None;

    loop {
        tokio::select! {
            _ = &mut send_task => break,

            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => match SignalMessage::from_json(&text) {
                    Ok(signal) => {
                        handle_signal(&service, &room_id, &connection, &mut joined, signal).await;
                    }
                    Err(e) => {
                        warn!(room = %room_id, "Invalid SignalMessage: {}", e);
                        connection.send(SignalMessage::error(format!("invalid message: {}", e)));
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(room = %room_id, "WebSocket error: {}", e);
                    break;
                }
            }
        }
    }

    send_task.abort();

    if let Some(participant_id) = joined {
        service
            .rooms
            .dispatch(
                &room_id,
                RoomCommand::Disconnect {
                    participant_id: participant_id.clone(),
                    connection_id: connection.id(),
                },
            )
            .await;
        info!(room = %room_id, participant = %participant_id, "WebSocket disconnected");
    } else {
        info!(room = %room_id, "WebSocket disconnected before join");
    }
}

async fn handle_signal(
    service: &SignalingService,
    room_id: &RoomId,
    connection: &ParticipantConnection,
    joined: &mut Option<ParticipantId>,
    signal: SignalMessage,
) {
    if let SignalMessage::Join { from } = signal {
        // A socket that changes identity leaves under its old one first.
        if let Some(previous) = joined.take().filter(|p| *p != from) {
            service
                .rooms
                .dispatch(
                    room_id,
                    RoomCommand::Disconnect {
                        participant_id: previous,
                        connection_id: connection.id(),
                    },
                )
                .await;
        }

        *joined = Some(from.clone());
        service
            .rooms
            .dispatch(
                room_id,
                RoomCommand::Join {
                    participant_id: from,
                    connection: connection.clone(),
                },
            )
            .await;
        return;
    }

    if signal.is_server_only() {
        connection.send(SignalMessage::error(format!(
            "'{}' is only sent by the relay",
            signal.kind()
        )));
        return;
    }

    let Some(participant_id) = joined.clone() else {
        connection.send(SignalMessage::error(format!(
            "join the room before sending '{}'",
            signal.kind()
        )));
        return;
    };

    if signal.sender() != Some(&participant_id) {
        connection.send(SignalMessage::error(format!(
            "'from' does not match joined participant {}",
            participant_id
        )));
        return;
    }

    let is_leave = matches!(signal, SignalMessage::Leave { .. });

    service
        .rooms
        .dispatch(
            room_id,
            RoomCommand::Signal {
                participant_id,
                connection_id: connection.id(),
                message: signal,
            },
        )
        .await;

    if is_leave {
        *joined = None;
    }
}
