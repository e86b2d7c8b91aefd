use crate::integration::init_tracing;
use crate::utils::{SessionFixture, camera_stream, pid};
use huddle_core::SignalMessage;

#[tokio::test]
async fn test_muted_state_announced_to_new_peers() {
    init_tracing();
    let fx = SessionFixture::new("A");
    fx.media.replace_stream(camera_stream("cam")).await;
    fx.media.set_audio_enabled(false).await;
    let before = fx.output.audio_toggles().len();

    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") })
        .await;
    assert_eq!(fx.output.audio_toggles().len(), before + 1);

    // Own reconnect: the roster arrives again and is told once.
    fx.deliver(SignalMessage::Participants {
        participants: vec![pid("B"), pid("C")],
    })
    .await;

    let toggles = fx.output.audio_toggles();
    assert_eq!(toggles.len(), before + 2);
    assert!(toggles.iter().all(|enabled| !enabled));
    assert!(fx.output.sent().iter().all(|m| match m {
        SignalMessage::AudioToggle { from, .. } => *from == pid("A"),
        _ => true,
    }));
}

#[tokio::test]
async fn test_unmuted_state_not_announced() {
    init_tracing();
    let fx = SessionFixture::new("A");
    fx.media.replace_stream(camera_stream("cam")).await;

    fx.deliver(SignalMessage::ParticipantJoined { from: pid("B") })
        .await;
    fx.deliver(SignalMessage::Participants {
        participants: vec![pid("C")],
    })
    .await;

    assert!(fx.output.audio_toggles().is_empty());
}
