use meshcall_core::{IceCandidate, ParticipantId, RelayMessage, SessionDescription};

use crate::integration::{init_tracing, start_relay};
use crate::utils::TestWsClient;

#[tokio::test]
async fn test_directed_offer_reaches_target_only() {
    init_tracing();

    let (addr, _registry) = start_relay().await;

    let mut a = TestWsClient::connect(addr, "R1", "a").await;
    let mut b = TestWsClient::connect(addr, "R1", "b").await;
    let mut c = TestWsClient::connect(addr, "R1", "c").await;
    b.recv().await;
    c.recv().await;

    let offer = SessionDescription::offer("v=0 from-c");
    c.send(RelayMessage::Offer {
        offer: offer.clone(),
        to_user_id: ParticipantId::from("a"),
    })
    .await;

    let received = a.recv().await;
    assert_eq!(received.from_user_id, Some(ParticipantId::from("c")));
    assert_eq!(
        received.message,
        RelayMessage::Offer {
            offer,
            to_user_id: ParticipantId::from("a"),
        }
    );
    b.expect_quiet().await;

    // Directed frames toward someone absent are dropped
    a.send(RelayMessage::IceCandidate {
        candidate: IceCandidate::new("candidate:a-1"),
        to_user_id: ParticipantId::from("zed"),
    })
    .await;
    b.expect_quiet().await;
    c.expect_quiet().await;

    a.close().await;
    b.close().await;
    c.close().await;
}
