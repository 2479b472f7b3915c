//! Tests for the asynchronous session actor.
//!
//! The tokio clock is paused so acknowledgment and response timeouts elapse
//! instantly once the actor is idle.

mod common;

use std::time::Duration;

use common::session;
use textframe::{TransmissionPhase, TunnelActor, TunnelConfig, TunnelError};
use textframe_testing::relay::{self, RELAY, test_key};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn actor_completes_an_exchange() {
    let (session, transport) = session(TunnelConfig::new(RELAY), 10);
    let (handle, task) = TunnelActor::spawn(session);

    let id = handle
        .start_transmission(b"ping".to_vec(), test_key())
        .await
        .expect("start");
    assert_eq!(id.get(), 10);

    handle.deliver(RELAY, relay::ack(10, 0)).await.expect("deliver ack");
    for text in relay::success(10, 200, "pong", &test_key()) {
        handle.deliver(RELAY, text).await.expect("deliver reply");
    }

    let state = handle
        .wait_for(|state| state.phase == TransmissionPhase::WaitingForUserResponse)
        .await
        .expect("settled");
    assert_eq!(state.last_status_code, Some(200));
    assert_eq!(transport.last().as_deref(), Some("01-CRADLE-000010-000-ACK"));

    handle.finish().await.expect("finish");
    handle
        .wait_for(|state| state.phase == TransmissionPhase::Done)
        .await
        .expect("idle");

    handle.shutdown();
    let session = task.await.expect("actor task");
    assert_eq!(session.phase(), TransmissionPhase::Done);
}

#[tokio::test(start_paused = true)]
async fn silent_relay_exhausts_resends() {
    let (session, transport) = session(TunnelConfig::new(RELAY), 1);
    let (handle, task) = TunnelActor::spawn(session);
    let started = Instant::now();

    handle
        .start_transmission(b"ping".to_vec(), test_key())
        .await
        .expect("start");
    let state = handle
        .wait_for(|state| state.phase == TransmissionPhase::TimeOut)
        .await
        .expect("timed out");

    // Waits of 10, 20 and 30 seconds.
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(transport.len(), 3);
    assert!(state.last_error_message.is_some());

    drop(handle);
    task.await.expect("actor stops once every handle is dropped");
}

#[tokio::test(start_paused = true)]
async fn missing_reply_times_out() {
    let config = TunnelConfig::new(RELAY).response_timeout(Duration::from_secs(30));
    let (session, _transport) = session(config, 1);
    let (handle, _task) = TunnelActor::spawn(session);
    let started = Instant::now();

    handle
        .start_transmission(b"ping".to_vec(), test_key())
        .await
        .expect("start");
    handle.deliver(RELAY, relay::ack(1, 0)).await.expect("deliver ack");

    let state = handle
        .wait_for(|state| state.phase.is_terminal())
        .await
        .expect("terminal");
    assert_eq!(state.phase, TransmissionPhase::TimeOut);
    assert_eq!(state.last_error_message.as_deref(), Some("no response from relay"));
    assert!(started.elapsed() >= Duration::from_secs(30));
    assert!(started.elapsed() < Duration::from_secs(40));
}

#[tokio::test(start_paused = true)]
async fn concurrent_start_is_refused() {
    let (session, transport) = session(TunnelConfig::new(RELAY), 1);
    let (handle, _task) = TunnelActor::spawn(session);

    handle
        .start_transmission(b"one".to_vec(), test_key())
        .await
        .expect("start");
    let err = handle
        .start_transmission(b"two".to_vec(), test_key())
        .await
        .expect_err("busy");
    assert!(matches!(err, TunnelError::TransmissionActive));
    assert_eq!(transport.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn abandon_stops_the_timers() {
    let (session, transport) = session(TunnelConfig::new(RELAY), 1);
    let (handle, _task) = TunnelActor::spawn(session);

    handle
        .start_transmission(b"one".to_vec(), test_key())
        .await
        .expect("start");
    handle.abandon().await.expect("abandon");
    handle
        .wait_for(|state| state.phase == TransmissionPhase::Done)
        .await
        .expect("idle");

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.len(), 1, "no resend after abandon");
}

#[tokio::test(start_paused = true)]
async fn closed_actor_rejects_commands() {
    let (session, _transport) = session(TunnelConfig::new(RELAY), 1);
    let (handle, task) = TunnelActor::spawn(session);
    handle.shutdown();
    task.await.expect("actor task");

    let err = handle
        .start_transmission(b"late".to_vec(), test_key())
        .await
        .expect_err("actor gone");
    assert!(matches!(err, TunnelError::SessionClosed));
}
