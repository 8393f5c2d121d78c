use meshcall_core::{ParticipantId, RelayMessage};

use crate::integration::{init_tracing, start_relay};
use crate::utils::TestWsClient;

#[tokio::test]
async fn test_invalid_frames_ignored() {
    init_tracing();

    let (addr, _registry) = start_relay().await;

    let mut a = TestWsClient::connect(addr, "R1", "a").await;
    let mut b = TestWsClient::connect(addr, "R1", "b").await;
    b.recv().await;

    a.send_text("not json".into()).await;
    a.send_text(r#"{"type":"teleport","to_user_id":"b"}"#.into()).await;

    // Presence about someone else and a client-made roster are not relayed
    a.send(RelayMessage::UserLeft {
        user_id: ParticipantId::from("b"),
    })
    .await;
    a.send(RelayMessage::ExistingUsers {
        users: vec![ParticipantId::from("ghost")],
    })
    .await;
    b.expect_quiet().await;

    // The connection survives all of the above
    a.send(RelayMessage::UserJoined {
        user_id: ParticipantId::from("a"),
        user_name: Some("Ann".into()),
    })
    .await;
    let joined = b.recv().await;
    assert_eq!(joined.from_user_id, Some(ParticipantId::from("a")));
    assert_eq!(
        joined.message,
        RelayMessage::UserJoined {
            user_id: ParticipantId::from("a"),
            user_name: Some("Ann".into()),
        }
    );

    a.close().await;
    b.close().await;
}
