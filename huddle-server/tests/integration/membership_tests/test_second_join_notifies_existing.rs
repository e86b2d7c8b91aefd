use huddle_core::SignalMessage;
use huddle_server::RoomManager;

use crate::integration::{init_tracing, test_room};
use crate::utils::{TestParticipant, pid, sorted};

#[tokio::test]
async fn test_second_join_notifies_existing() {
    init_tracing();

    let rooms = RoomManager::new();
    let room = test_room();
    let mut a = TestParticipant::new("A");
    let mut b = TestParticipant::new("B");
    let mut c = TestParticipant::new("C");

    a.join(&rooms, &room).await;
    a.expect().await;

    b.join(&rooms, &room).await;
    assert_eq!(
        b.expect().await,
        SignalMessage::Participants {
            participants: vec![pid("A")]
        }
    );
    assert_eq!(a.expect().await, SignalMessage::ParticipantJoined { from: pid("B") });

    c.join(&rooms, &room).await;
    let SignalMessage::Participants { participants } = c.expect().await else {
        panic!("joiner should receive the participant list first");
    };
    assert_eq!(sorted(participants), vec![pid("A"), pid("B")]);
    assert_eq!(a.expect().await, SignalMessage::ParticipantJoined { from: pid("C") });
    assert_eq!(b.expect().await, SignalMessage::ParticipantJoined { from: pid("C") });

    c.assert_silent().await;
}
