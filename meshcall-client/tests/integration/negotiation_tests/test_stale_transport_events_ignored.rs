use meshcall_client::{NegotiationState, RelayCommand, RelayConnector, SessionEvent};
use meshcall_core::{ParticipantId, RelayFrame, RelayMessage, RoomId, SessionDescription};

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TEST_ROOM, TestPeer};

/// After glare replaces B's offering transport, late events of the closed
/// transport must not touch the link that replaced it.
#[tokio::test]
async fn test_stale_transport_events_ignored() {
    init_tracing();

    let relay = MockRelay::new();
    let mut b = TestPeer::join("b", &relay).await;

    // "a" is driven by hand so that its offer can race B's
    let a = ParticipantId::from("a");
    let mut raw = relay
        .connect(&RoomId::from(TEST_ROOM), &a)
        .await
        .expect("raw connect failed");
    let send = |message: RelayMessage| {
        raw.outbound
            .send(RelayCommand::Send(RelayFrame::new(a.clone(), message)))
            .expect("raw relay closed");
    };
    send(RelayMessage::UserJoined {
        user_id: a.clone(),
        user_name: Some("User a".into()),
    });

    loop {
        let frame = raw.inbound.recv().await.expect("raw relay closed");
        if matches!(frame.message, RelayMessage::Offer { .. }) {
            break;
        }
    }

    send(RelayMessage::Offer {
        offer: SessionDescription::offer("v=0 mock from=a tracks=2"),
        to_user_id: b.id.clone(),
    });
    b.wait_negotiated("a").await;
    assert_eq!(b.transports.created_for(&a), 2, "glare replaced the first transport");

    b.transports.fail_nth(&a, 0).await;
    b.transports.gather_nth(&a, 0, "candidate:stale").await;
    TestPeer::settle().await;

    let view = b.handle.snapshot().await.expect("B closed");
    assert_eq!(view.link(&a).map(|l| l.state), Some(NegotiationState::Negotiated));
    assert!(!b.transports.latest(&a).is_some_and(|t| t.closed));

    while let Ok(event) = b.events.try_recv() {
        assert!(
            !matches!(event, SessionEvent::ParticipantUnreachable { .. }),
            "stale failure applied: {:?}",
            event
        );
    }
    while let Ok(frame) = raw.inbound.try_recv() {
        if let RelayMessage::IceCandidate { candidate, .. } = frame.message {
            assert!(!candidate.candidate.contains("stale"), "stale candidate forwarded");
        }
    }

    b.handle.leave().await.expect("leave failed");
}
