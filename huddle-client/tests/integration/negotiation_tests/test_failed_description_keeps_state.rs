use crate::integration::init_tracing;
use crate::utils::{SessionFixture, offer, pid};
use huddle_client::SessionPhase;
use huddle_core::SignalMessage;

#[tokio::test]
async fn test_failed_description_keeps_state() {
    init_tracing();
    let fx = SessionFixture::new("A");

    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") }).await;
    fx.factory.latest(&pid("B")).reject_remote_descriptions();

    fx.deliver(offer("B", "A")).await;

    let snapshot = fx.sessions.snapshot(&pid("B")).unwrap();
    assert_eq!(snapshot.phase, SessionPhase::New);
    assert!(!snapshot.remote_description_applied);
    assert_eq!(fx.output.answers_to(&pid("B")), 0);
    assert!(fx.sessions.has_session(&pid("B")), "session is not torn down");
    assert!(!fx.factory.latest(&pid("B")).is_closed());
}
