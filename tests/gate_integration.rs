use std::thread;
use std::time::Duration;

use preview_surface::{Error, SurfaceReadinessGate};
use tokio_util::sync::CancellationToken;

#[test]
fn duplicate_signal_keeps_first_handle_for_every_caller() {
    let gate = SurfaceReadinessGate::<&'static str>::new();
    let before: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            thread::spawn(move || gate.acquire())
        })
        .collect();

    assert!(gate.signal_ready("h1"));
    assert!(!gate.signal_ready("h2"));

    let after: Vec<_> = (0..4)
        .map(|_| {
            let gate = gate.clone();
            thread::spawn(move || gate.acquire())
        })
        .collect();
    for waiter in before.into_iter().chain(after) {
        assert_eq!(waiter.join().expect("waiter thread"), "h1");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_token_releases_blocked_waiter() {
    let gate = SurfaceReadinessGate::<u32>::new();
    let cancel = CancellationToken::new();

    let handle = tokio::task::spawn_blocking({
        let gate = gate.clone();
        let cancel = cancel.clone();
        move || gate.acquire_cancellable(&cancel)
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_finished(), "waiter returned before cancellation");
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("waiter did not observe cancellation")
        .expect("waiter panicked");
    assert!(matches!(result, Err(Error::NotReady)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn child_token_cancellation_is_honoured() {
    let gate = SurfaceReadinessGate::<u32>::new();
    let parent = CancellationToken::new();
    let child = parent.child_token();

    let handle = tokio::task::spawn_blocking({
        let gate = gate.clone();
        move || gate.acquire_cancellable(&child)
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    parent.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("waiter did not observe cancellation")
        .expect("waiter panicked");
    assert!(matches!(result, Err(Error::NotReady)));
}
