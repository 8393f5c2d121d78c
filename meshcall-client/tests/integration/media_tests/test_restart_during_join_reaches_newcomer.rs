use meshcall_client::SessionEvent;
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{MockDevices, MockRelay, TestPeer, TestPeerBuilder};

#[tokio::test(start_paused = true)]
async fn test_restart_during_join_reaches_newcomer() {
    init_tracing();

    let relay = MockRelay::new();
    let devices = MockDevices::granted().with_delays([Duration::ZERO, Duration::from_millis(500)]);
    let mut a = TestPeerBuilder::new("a")
        .devices(devices)
        .join(&relay)
        .await
        .expect("join failed");

    let generation = a.handle.restart_capture(None).await.expect("A closed");
    assert_eq!(generation, 1);

    // B arrives while A's devices are still being reopened
    let mut b = TestPeer::join("b", &relay).await;
    a.wait_negotiated("b").await;

    a.wait_for(|e| match e {
        SessionEvent::LocalMediaChanged(s) if s.generation == 1 && s.track_count == 2 => Some(()),
        _ => None,
    })
    .await;

    b.wait_remote_stream("a", 2).await;

    TestPeer::settle().await;
    let transport = a.transports.latest(&b.id).expect("no transport to B");
    assert_eq!(transport.attached_track_ids.len(), 2);
    assert!(
        transport
            .attached_track_ids
            .iter()
            .all(|id| id.starts_with("capture-1-"))
    );
    assert_eq!(a.transports.created_for(&b.id), 1, "same link carries the new tracks");

    a.handle.leave().await.expect("leave failed");
    b.handle.leave().await.expect("leave failed");
}
