use crate::integration::init_tracing;
use crate::utils::{MockConnectionFactory, pid, spawn_relay};
use huddle_client::{ChannelState, ClientConfig, RoomClient, SignalingChannel};
use huddle_core::{OpenDirectory, RoomId};
use huddle_server::SignalingService;
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_count(service: &SignalingService, room: &RoomId, expected: usize) {
    for _ in 0..300 {
        if service.rooms().participant_count(room).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room never reached {} participants", expected);
}

#[tokio::test]
async fn test_dropped_handle_leaves_room() {
    init_tracing();
    let service = SignalingService::default();
    let addr = spawn_relay(service.clone()).await;
    let room = RoomId::from("standup");

    let (channel, _inbound) =
        SignalingChannel::connect(format!("ws://{}/ws/standup", addr), pid("A"));
    channel.ready().await.unwrap();
    wait_for_count(&service, &room, 1).await;

    drop(channel);

    wait_for_count(&service, &room, 0).await;
    // No re-join after the socket closed.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(service.rooms().participant_count(&room).await, 0);
}

#[tokio::test]
async fn test_dropped_receiver_closes_channel() {
    init_tracing();
    let service = SignalingService::default();
    let addr = spawn_relay(service.clone()).await;
    let room = RoomId::from("standup");

    let (channel, inbound) =
        SignalingChannel::connect(format!("ws://{}/ws/standup", addr), pid("A"));
    channel.ready().await.unwrap();
    wait_for_count(&service, &room, 1).await;

    drop(inbound);

    let mut state = channel.subscribe();
    tokio::time::timeout(
        Duration::from_secs(2),
        state.wait_for(|s| *s == ChannelState::Closed),
    )
    .await
    .unwrap()
    .unwrap();
    wait_for_count(&service, &room, 0).await;
}

#[tokio::test]
async fn test_dropped_client_leaves_room() {
    init_tracing();
    let service = SignalingService::default();
    let addr = spawn_relay(service.clone()).await;
    let room = RoomId::from("standup");

    let (client, _events) = RoomClient::join_with(
        ClientConfig::new(format!("ws://{}", addr)),
        &OpenDirectory,
        room.clone(),
        Arc::new(MockConnectionFactory::new()),
    )
    .await
    .unwrap();
    client.channel().ready().await.unwrap();
    wait_for_count(&service, &room, 1).await;

    drop(client);

    wait_for_count(&service, &room, 0).await;
}
