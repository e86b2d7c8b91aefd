use crate::integration::init_tracing;
use crate::utils::{SessionFixture, candidate, pid};
use huddle_client::SessionPhase;
use huddle_core::SignalMessage;

#[tokio::test]
async fn test_teardown_discards_queue() {
    init_tracing();
    let fx = SessionFixture::new("A");

    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") }).await;
    fx.deliver(candidate("B", "A", "c1")).await;
    fx.deliver(candidate("B", "A", "c2")).await;

    let connection = fx.factory.latest(&pid("B"));
    let snapshots = fx.sessions.subscribe(&pid("B")).unwrap();

    fx.deliver(SignalMessage::ParticipantLeft { from: pid("B") }).await;

    assert!(connection.is_closed());
    assert!(!fx.sessions.has_session(&pid("B")));
    assert_eq!(snapshots.borrow().phase, SessionPhase::Closed);
    assert_eq!(snapshots.borrow().pending_candidates, 0);

    // Late candidates for the departed peer go nowhere.
    fx.deliver(candidate("B", "A", "c3")).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    assert!(connection.applied_candidates().is_empty());
    assert_eq!(connection.early_candidates(), 0);
    assert_eq!(fx.factory.created_count(), 1);
}
