use crate::integration::init_tracing;
use crate::utils::{MockConnectionFactory, pid, spawn_relay};
use huddle_client::{ChannelError, ChannelState, ClientConfig, RoomClient, SignalingChannel};
use huddle_core::{OpenDirectory, RoomId, SignalMessage};
use huddle_server::SignalingService;
use std::sync::Arc;
use std::time::Duration;

async fn wait_for_count(service: &SignalingService, room: &RoomId, expected: usize) {
    for _ in 0..200 {
        if service.rooms().participant_count(room).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room never reached {} participants", expected);
}

#[tokio::test]
async fn test_channel_join_and_disconnect() {
    init_tracing();
    let service = SignalingService::default();
    let addr = spawn_relay(service.clone()).await;
    let room = RoomId::from("standup");

    let (channel, mut inbound) =
        SignalingChannel::connect(format!("ws://{}/ws/standup", addr), pid("A"));
    channel.ready().await.unwrap();
    assert_eq!(channel.state(), ChannelState::Open);

    // The relay answers the automatic join.
    let first = tokio::time::timeout(Duration::from_secs(2), inbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        first,
        SignalMessage::Participants {
            participants: vec![]
        }
    );
    wait_for_count(&service, &room, 1).await;

    channel.disconnect().await;

    assert_eq!(channel.state(), ChannelState::Closed);
    wait_for_count(&service, &room, 0).await;
    assert!(!channel.send(SignalMessage::Leave { from: pid("A") }));
    assert_eq!(channel.ready().await, Err(ChannelError::Closed));
}

#[tokio::test]
async fn test_room_id_with_reserved_characters() {
    init_tracing();
    let service = SignalingService::default();
    let addr = spawn_relay(service.clone()).await;
    let room = RoomId::from("team a/b?x");

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
    client.leave().await;
    wait_for_count(&service, &room, 0).await;
}
