//! End-to-end call lifecycle scenarios against mock adapters.
//!
//! Timer-sensitive tests run on a paused tokio clock; `sleep` advances
//! virtual time, so the 60-second ring timeout and talk-time durations are
//! exercised exactly without wall-clock waits.

mod common;

use std::time::Duration;

use common::*;
use peercall_core::{
    CallDirection, CallLogStore, CallOutcome, CallState, MediaKind, MediaSessionEvent,
};

#[tokio::test(start_paused = true)]
async fn outgoing_call_connects_and_completes() {
    let h = harness("alice");

    let session_id = h
        .session
        .initiate("bob", MediaKind::Audio)
        .await
        .expect("initiate failed");
    assert_eq!(h.session.current_state().await, CallState::Calling);

    let sent = h.signaling.sent();
    assert!(
        matches!(&sent[0], Sent::Offer { to, .. } if to == "bob"),
        "first outbound message must be the offer"
    );

    h.session.handle_signal(answer_from("bob", "alice")).await;
    assert_eq!(h.session.current_state().await, CallState::Connecting);
    assert_eq!(
        h.engine.session().applied_remote.lock().unwrap().len(),
        1,
        "answer description must be applied to the media session"
    );

    h.engine.session().push(MediaSessionEvent::Connected).await;
    wait_for_state(&h.session, CallState::Connected).await;

    let snapshot = h.session.snapshot().await.expect("no active session");
    assert_eq!(snapshot.session_id, session_id);
    assert_eq!(snapshot.direction, CallDirection::Outgoing);
    assert!(snapshot.connected_at.is_some());

    // 30 seconds of talk time on the virtual clock
    tokio::time::sleep(Duration::from_secs(30)).await;

    h.session.hangup().await.expect("hangup failed");
    assert_eq!(h.session.current_state().await, CallState::Idle);

    let entries = wait_for_entries(&h.store, "alice", 1).await;
    assert_eq!(entries[0].caller_id, "alice");
    assert_eq!(entries[0].receiver_id, "bob");
    assert_eq!(entries[0].outcome, CallOutcome::Completed);
    assert_eq!(entries[0].duration_seconds, 30);

    assert_eq!(h.signaling.ends_sent_to("bob"), 1);
    assert!(h.engine.session().is_closed());
    assert_eq!(h.engine.released_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_call_times_out_as_no_answer() {
    let h = harness("alice");

    h.session
        .initiate("bob", MediaKind::Audio)
        .await
        .expect("initiate failed");

    // just under the timeout: still ringing
    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(h.session.current_state().await, CallState::Calling);

    tokio::time::sleep(Duration::from_secs(2)).await;
    wait_for_state(&h.session, CallState::Idle).await;

    let entries = wait_for_entries(&h.store, "alice", 1).await;
    assert_eq!(entries[0].outcome, CallOutcome::NoAnswer);
    assert_eq!(entries[0].duration_seconds, 0);

    assert_eq!(h.signaling.ends_sent_to("bob"), 1);
    assert!(h.engine.session().is_closed());
    assert_eq!(h.engine.released_count(), 1);
}

#[tokio::test]
async fn callee_decline_records_rejected_without_media() {
    let h = harness("bob");

    h.session
        .handle_signal(offer_from("alice", "bob", MediaKind::AudioVideo))
        .await;
    assert_eq!(h.session.current_state().await, CallState::Receiving);

    h.session.decline().await.expect("decline failed");
    assert_eq!(h.session.current_state().await, CallState::Idle);

    let entries = wait_for_entries(&h.store, "bob", 1).await;
    assert_eq!(entries[0].caller_id, "alice");
    assert_eq!(entries[0].receiver_id, "bob");
    assert_eq!(entries[0].outcome, CallOutcome::Rejected);

    // declining never touches the media engine
    assert_eq!(h.engine.acquired.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(h.engine.sessions_created(), 0);
    assert_eq!(h.signaling.ends_sent_to("alice"), 1);
}

#[tokio::test]
async fn caller_sees_decline_as_rejected() {
    let h = harness("alice");

    h.session
        .initiate("bob", MediaKind::Audio)
        .await
        .expect("initiate failed");

    h.session.handle_signal(end_from("bob", "alice")).await;
    assert_eq!(h.session.current_state().await, CallState::Idle);

    let entries = wait_for_entries(&h.store, "alice", 1).await;
    assert_eq!(entries[0].outcome, CallOutcome::Rejected);

    // the remote party already knows; no End echoes back
    assert_eq!(h.signaling.ends_sent_to("bob"), 0);
    assert!(h.engine.session().is_closed());
}

#[tokio::test(start_paused = true)]
async fn incoming_call_accepted_and_completed() {
    let h = harness("bob");

    h.session
        .handle_signal(offer_from("alice", "bob", MediaKind::Audio))
        .await;
    let receiving = h.session.snapshot().await.expect("no session after offer");
    assert_eq!(receiving.state, CallState::Receiving);
    assert_eq!(receiving.direction, CallDirection::Incoming);

    h.session.accept().await.expect("accept failed");
    assert_eq!(h.session.current_state().await, CallState::Connecting);
    assert!(
        matches!(h.signaling.sent().last(), Some(Sent::Answer { to, .. }) if to == "alice"),
        "accepting must send the answer to the caller"
    );

    h.engine.session().push(MediaSessionEvent::Connected).await;
    wait_for_state(&h.session, CallState::Connected).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    h.session.hangup().await.expect("hangup failed");

    let entries = wait_for_entries(&h.store, "bob", 1).await;
    assert_eq!(entries[0].caller_id, "alice");
    assert_eq!(entries[0].receiver_id, "bob");
    assert_eq!(entries[0].outcome, CallOutcome::Completed);
    assert_eq!(entries[0].duration_seconds, 5);

    // same entry is visible from the caller's side of the store
    assert_eq!(h.store.list("alice", 10).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn caller_giving_up_while_ringing_is_no_answer() {
    let h = harness("alice");

    h.session
        .initiate("bob", MediaKind::Audio)
        .await
        .expect("initiate failed");
    tokio::time::sleep(Duration::from_secs(10)).await;

    h.session.hangup().await.expect("hangup failed");

    let entries = wait_for_entries(&h.store, "alice", 1).await;
    assert_eq!(entries[0].outcome, CallOutcome::NoAnswer);
    assert_eq!(entries[0].duration_seconds, 0);
}

#[tokio::test]
async fn history_and_stats_reflect_recorded_calls() {
    let h = harness("bob");

    h.session
        .handle_signal(offer_from("alice", "bob", MediaKind::Audio))
        .await;
    h.session.decline().await.expect("decline failed");
    wait_for_entries(&h.store, "bob", 1).await;

    let history = h.session.call_history(10).await.expect("history failed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].outcome, CallOutcome::Rejected);

    let stats = h.session.call_stats().await.expect("stats failed");
    assert_eq!(stats.total_calls, 1);
    assert_eq!(stats.rejected, 1);

    h.session.clear_history().await.expect("clear failed");
    assert!(h.session.call_history(10).await.unwrap().is_empty());
}
