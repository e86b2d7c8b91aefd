use crate::integration::init_tracing;
use crate::utils::{SessionFixture, pid};
use huddle_client::SessionPhase;
use huddle_core::SignalMessage;

#[tokio::test]
async fn test_rejoin_replaces_session() {
    init_tracing();
    let fx = SessionFixture::new("A");

    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") }).await;
    let first = fx.factory.latest(&pid("B"));

    // B dropped and came back before we saw it leave.
    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") }).await;

    assert!(first.is_closed());
    assert_eq!(fx.factory.connections_for(&pid("B")).len(), 2);
    assert_eq!(fx.sessions.session_count(), 1);
    assert!(!fx.factory.latest(&pid("B")).is_closed());
    assert_eq!(
        fx.sessions.snapshot(&pid("B")).unwrap().phase,
        SessionPhase::New
    );
}

#[tokio::test]
async fn test_own_reconnect_starts_fresh_negotiation() {
    init_tracing();
    let fx = SessionFixture::new("A");

    let participants = SignalMessage::Participants {
        participants: vec![pid("B")],
    };
    fx.deliver(participants.clone()).await;
    let first = fx.factory.latest(&pid("B"));

    fx.deliver(participants).await;

    assert!(first.is_closed());
    assert_eq!(fx.output.offers_to(&pid("B")), 2);
    assert_eq!(
        fx.sessions.snapshot(&pid("B")).unwrap().phase,
        SessionPhase::OfferSent
    );
}
