use meshcall_core::{RelayFrame, RelayMessage, RoomId};

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TEST_ROOM, TestPeer};

#[tokio::test]
async fn test_self_echo_filtered() {
    init_tracing();

    let relay = MockRelay::new();
    let room = RoomId::from(TEST_ROOM);
    let a = TestPeer::join("a", &relay).await;

    // A relay that echoes A's own broadcasts back to it
    relay.deliver(
        &room,
        &a.id,
        RelayFrame::new(
            a.id.clone(),
            RelayMessage::UserJoined {
                user_id: a.id.clone(),
                user_name: None,
            },
        ),
    );
    relay.deliver(
        &room,
        &a.id,
        RelayFrame::new(
            a.id.clone(),
            RelayMessage::ChatMessage {
                message: "echo".into(),
                timestamp: 1,
                user_name: None,
            },
        ),
    );
    TestPeer::settle().await;

    let view = a.handle.snapshot().await.expect("A closed");
    assert_eq!(view.participants.len(), 1);
    assert!(view.chat.is_empty());
    assert!(view.links.is_empty());

    a.handle.leave().await.expect("leave failed");
}
