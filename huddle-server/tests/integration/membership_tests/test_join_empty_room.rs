use huddle_core::SignalMessage;
use huddle_server::RoomManager;

use crate::integration::{init_tracing, test_room};
use crate::utils::TestParticipant;

#[tokio::test]
async fn test_join_empty_room() {
    init_tracing();

    let rooms = RoomManager::new();
    let room = test_room();
    let mut a = TestParticipant::new("A");

    a.join(&rooms, &room).await;

    assert_eq!(
        a.expect().await,
        SignalMessage::Participants {
            participants: vec![]
        }
    );
    assert!(rooms.is_room_active(&room));
    assert_eq!(rooms.participant_count(&room).await, 1);
}
