use huddle_core::SignalMessage;
use huddle_server::RoomManager;

use crate::integration::{init_tracing, test_room};
use crate::utils::{TestParticipant, offer, pid};

#[tokio::test]
async fn test_missing_target_dropped() {
    init_tracing();

    let rooms = RoomManager::new();
    let room = test_room();
    let mut a = TestParticipant::new("A");
    let mut b = TestParticipant::new("B");

    a.join(&rooms, &room).await;
    a.expect().await;
    b.join(&rooms, &room).await;
    b.expect().await;
    a.expect().await;

    // Unknown target: silently dropped, no error back to the sender.
    a.signal(&rooms, &room, offer("A", "ghost")).await;
    a.assert_silent().await;

    // Target whose socket stopped reading is treated as absent.
    b.close_writer();
    a.signal(&rooms, &room, offer("A", "B")).await;
    a.assert_silent().await;

    // The relay keeps serving the sender.
    assert_eq!(rooms.participant_count(&room).await, 2);
    a.signal(&rooms, &room, SignalMessage::Leave { from: pid("A") })
        .await;
    assert_eq!(rooms.participants(&room).await, vec![pid("B")]);
}
