use huddle_core::SignalMessage;
use huddle_server::RoomManager;

use crate::integration::{init_tracing, test_room};
use crate::utils::{TestParticipant, pid};

#[tokio::test]
async fn test_audio_toggle_broadcast() {
    init_tracing();

    let rooms = RoomManager::new();
    let room = test_room();
    let mut a = TestParticipant::new("A");
    let mut b = TestParticipant::new("B");
    let mut c = TestParticipant::new("C");

    a.join(&rooms, &room).await;
    b.join(&rooms, &room).await;
    c.join(&rooms, &room).await;
    a.expect().await;
    a.expect().await;
    a.expect().await;
    b.expect().await;
    b.expect().await;
    c.expect().await;

    let toggle = SignalMessage::AudioToggle {
        from: pid("A"),
        audio_enabled: false,
    };
    a.signal(&rooms, &room, toggle.clone()).await;

    assert_eq!(b.expect().await, toggle);
    assert_eq!(c.expect().await, toggle);
    a.assert_silent().await;
}
