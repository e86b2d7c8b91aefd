use crate::integration::init_tracing;
use crate::utils::{PcOp, SessionFixture, candidate, offer, pid};
use huddle_core::{SdpKind, SignalMessage};

#[tokio::test]
async fn test_early_candidates_flushed_in_order() {
    init_tracing();
    let fx = SessionFixture::new("A");

    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") }).await;
    for c in ["c1", "c2", "c3"] {
        fx.deliver(candidate("B", "A", c)).await;
    }

    let connection = fx.factory.latest(&pid("B"));
    let snapshot = fx.sessions.snapshot(&pid("B")).unwrap();
    assert_eq!(snapshot.pending_candidates, 3);
    assert!(!snapshot.remote_description_applied);
    assert!(connection.applied_candidates().is_empty());

    fx.deliver(offer("B", "A")).await;

    assert_eq!(
        connection.ops(),
        vec![
            PcOp::SetRemote(SdpKind::Offer),
            PcOp::AddCandidate("c1".into()),
            PcOp::AddCandidate("c2".into()),
            PcOp::AddCandidate("c3".into()),
            PcOp::CreateAnswer,
        ]
    );
    assert_eq!(connection.early_candidates(), 0, "applied before the description");

    let snapshot = fx.sessions.snapshot(&pid("B")).unwrap();
    assert_eq!(snapshot.pending_candidates, 0);
    assert!(snapshot.remote_description_applied);

    // Once the description is in, candidates are applied straight away.
    fx.deliver(candidate("B", "A", "c4")).await;
    assert_eq!(connection.applied_candidates(), vec!["c1", "c2", "c3", "c4"]);
    assert_eq!(fx.sessions.snapshot(&pid("B")).unwrap().pending_candidates, 0);
}
