//! Denon control port tests against an in-process fake receiver

mod common;

use bravia_denon_sync::{
    plan_reconcile, DenonClient, ReceiverCommand, ReceiverPower, SyncError, VolumeReading,
};
use common::{closed_address, FakeReceiver, QueryBehavior, ReceiverState};
use rstest::rstest;
use std::time::{Duration, Instant};

#[rstest]
#[case("PWON", ReceiverPower::On)]
#[case("PWSTANDBY", ReceiverPower::Off)]
#[case("PWBOGUS", ReceiverPower::Unknown("PWBOGUS".to_string()))]
#[tokio::test]
async fn test_power_query(#[case] reply: &str, #[case] expected: ReceiverPower) {
    let receiver = FakeReceiver::start(ReceiverState {
        power: reply.to_string(),
        ..Default::default()
    })
    .await;

    let power = receiver.client().power().await.unwrap();
    assert_eq!(power, expected);
    assert_eq!(receiver.commands(), vec!["PW?"]);
}

#[rstest]
#[case("MV07", 7)]
#[case("MV40", 40)]
#[case("MV455", 45)]
#[case("MVXX", 0)]
#[tokio::test]
async fn test_volume_query(#[case] reply: &str, #[case] expected: u8) {
    let receiver = FakeReceiver::start(ReceiverState {
        volume: reply.to_string(),
        ..Default::default()
    })
    .await;

    let volume = receiver.client().volume().await.unwrap();
    assert_eq!(volume.value(), expected);
}

#[tokio::test]
async fn test_half_step_volume_needs_correction() {
    let receiver = FakeReceiver::start(ReceiverState {
        volume: "MV405".to_string(),
        ..Default::default()
    })
    .await;

    let volume = receiver.client().volume().await.unwrap();
    assert_eq!(volume.value(), 40);
    assert!(volume.is_half_step());

    let display = VolumeReading::from_raw(40.0, false).unwrap();
    assert_eq!(
        plan_reconcile(display, volume, 40),
        Some(ReceiverCommand::SetVolume(40))
    );
}

#[tokio::test]
async fn test_raw_query_reply_is_trimmed() {
    let receiver = FakeReceiver::start(ReceiverState::default()).await;
    let reply = receiver.client().send_command("PW?").await.unwrap();
    assert_eq!(reply, "PWON");
}

#[tokio::test]
async fn test_set_volume_sends_padded_command() {
    let receiver = FakeReceiver::start(ReceiverState::default()).await;
    let client = receiver.client();

    client.set_volume(7).await.unwrap();

    // the set command is fire-and-forget, give the fake a moment to record it
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(receiver.commands(), vec!["MV07"]);
    assert_eq!(receiver.volume(), "MV07");
}

#[tokio::test]
async fn test_non_query_returns_empty_reply() {
    let receiver = FakeReceiver::start(ReceiverState::default()).await;
    let reply = receiver
        .client()
        .send(ReceiverCommand::SetVolume(12))
        .await
        .unwrap();
    assert_eq!(reply, "");
}

#[tokio::test]
async fn test_one_connection_per_command() {
    let receiver = FakeReceiver::start(ReceiverState::default()).await;
    let client = receiver.client();

    client.power().await.unwrap();
    client.volume().await.unwrap();
    client.power().await.unwrap();

    assert_eq!(receiver.commands(), vec!["PW?", "MV?", "PW?"]);
}

#[tokio::test]
async fn test_silent_receiver_hits_read_deadline() {
    let receiver = FakeReceiver::start(ReceiverState {
        volume_query: QueryBehavior::Silent,
        ..Default::default()
    })
    .await;

    let started = Instant::now();
    let err = receiver.client().volume().await.unwrap_err();

    assert!(err.is_network(), "expected network error, got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_hangup_before_reply() {
    let receiver = FakeReceiver::start(ReceiverState {
        power_query: QueryBehavior::Hangup,
        ..Default::default()
    })
    .await;

    match receiver.client().power().await {
        Err(SyncError::Network(_)) => {}
        other => panic!("Expected SyncError::Network, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused() {
    let client = DenonClient::new(closed_address(), Duration::from_millis(500), Duration::from_millis(200));
    let err = client.send_command("PW?").await.unwrap_err();
    assert!(err.is_network());
}
