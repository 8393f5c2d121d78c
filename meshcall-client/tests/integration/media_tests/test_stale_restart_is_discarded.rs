use meshcall_client::{MediaConstraints, SessionEvent};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{MockDevices, MockRelay, TestPeerBuilder};

#[tokio::test(start_paused = true)]
async fn test_stale_restart_is_discarded() {
    init_tracing();

    let relay = MockRelay::new();
    let devices = MockDevices::granted().with_delays([
        Duration::ZERO,
        Duration::from_millis(500),
        Duration::from_millis(10),
    ]);
    let mut a = TestPeerBuilder::new("a")
        .devices(devices)
        .join(&relay)
        .await
        .expect("join failed");

    // R1 resolves late, R2 resolves early
    let r1 = a.handle.restart_capture(None).await.expect("A closed");
    let r2 = a
        .handle
        .restart_capture(Some(MediaConstraints::audio_only()))
        .await
        .expect("A closed");
    assert_eq!((r1, r2), (1, 2));

    a.wait_for(|e| match e {
        SessionEvent::LocalMediaChanged(s) if s.generation == 2 && s.track_count == 1 => Some(()),
        _ => None,
    })
    .await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(a.devices.calls(), 3);

    let view = a.handle.snapshot().await.expect("A closed");
    assert_eq!(view.local_media.generation, 2);
    assert_eq!(view.local_media.track_count, 1);

    while let Ok(event) = a.events.try_recv() {
        if let SessionEvent::LocalMediaChanged(s) = event {
            assert_eq!(s.generation, 2, "late R1 result leaked: {:?}", s);
        }
    }

    a.handle.leave().await.expect("leave failed");
}
