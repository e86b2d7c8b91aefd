use huddle_core::SignalMessage;
use huddle_server::RoomManager;

use crate::integration::{init_tracing, test_room};
use crate::utils::{TestParticipant, pid};

#[tokio::test]
async fn test_leave_and_close_track_count() {
    init_tracing();

    let rooms = RoomManager::new();
    let room = test_room();
    let mut participants: Vec<TestParticipant> = ["A", "B", "C", "D"]
        .into_iter()
        .map(TestParticipant::new)
        .collect();

    for (joined, p) in participants.iter().enumerate() {
        p.join(&rooms, &room).await;
        assert_eq!(rooms.participant_count(&room).await, joined + 1);
    }

    // Explicit leave.
    participants[1]
        .signal(&rooms, &room, SignalMessage::Leave { from: pid("B") })
        .await;
    assert_eq!(rooms.participant_count(&room).await, 3);

    // Socket close.
    participants[2].disconnect(&rooms, &room).await;
    assert_eq!(rooms.participant_count(&room).await, 2);

    // Closing twice, or after leaving, does not double-count.
    participants[2].disconnect(&rooms, &room).await;
    participants[1].disconnect(&rooms, &room).await;
    assert_eq!(rooms.participant_count(&room).await, 2);

    let mut remaining = rooms.participants(&room).await;
    remaining.sort();
    assert_eq!(remaining, vec![pid("A"), pid("D")]);

    // A saw both departures, in order.
    let a = &mut participants[0];
    let mut seen = Vec::new();
    loop {
        match a.expect().await {
            SignalMessage::ParticipantLeft { from } => {
                seen.push(from);
                if seen.len() == 2 {
                    break;
                }
            }
            _ => continue,
        }
    }
    assert_eq!(seen, vec![pid("B"), pid("C")]);
}
