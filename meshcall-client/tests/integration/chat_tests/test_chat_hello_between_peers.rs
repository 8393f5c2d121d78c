use meshcall_client::{MessageOrigin, SessionEvent};
use meshcall_core::RelayMessage;

use crate::integration::init_tracing;
use crate::utils::{MockRelay, TestPeer};

#[tokio::test]
async fn test_chat_hello_between_peers() {
    init_tracing();

    let relay = MockRelay::new();
    let mut a = TestPeer::join("a", &relay).await;
    let b = TestPeer::join("b", &relay).await;
    a.wait_connected("b", 2).await;

    let local = b
        .handle
        .send_chat("hello")
        .await
        .expect("B closed")
        .expect("message rejected");
    assert_eq!(local.origin, MessageOrigin::Local);
    assert_eq!(local.text, "hello");

    // Appended at send time, before anything comes back from the relay
    let b_view = b.handle.snapshot().await.expect("B closed");
    assert_eq!(b_view.chat.len(), 1);
    assert_eq!(b_view.chat[0].origin, MessageOrigin::Local);

    let received = a
        .wait_for(|e| match e {
            SessionEvent::Chat(m) => Some(m.clone()),
            _ => None,
        })
        .await;
    assert_eq!(received.origin, MessageOrigin::Remote);
    assert_eq!(received.sender_id, b.id);
    assert_eq!(received.sender_name, "User b");
    assert_eq!(received.text, "hello");
    assert_eq!(received.timestamp, local.timestamp);

    let frame = relay
        .log()
        .into_iter()
        .find(|f| matches!(f.message, RelayMessage::ChatMessage { .. }))
        .expect("no chat frame routed");
    assert_eq!(frame.from_user_id.as_ref(), Some(&b.id));

    // The sender never sees its own message twice
    TestPeer::settle().await;
    let b_view = b.handle.snapshot().await.expect("B closed");
    assert_eq!(b_view.chat.len(), 1);

    let a_view = a.handle.snapshot().await.expect("A closed");
    assert_eq!(a_view.chat.len(), 1);

    a.handle.leave().await.expect("leave failed");
    b.handle.leave().await.expect("leave failed");
}
