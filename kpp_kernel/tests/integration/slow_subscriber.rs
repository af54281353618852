//! Integration test: a subscriber that never drains its buffer must not
//! block the kernel's tick loop, and the dropped-frame count must show up
//! in the next committed snapshot's publisher stats.

use kpp_common::config::KernelConfig;
use kpp_common::sim::command::Command;

use kpp_kernel::kernel::Kernel;

#[tokio::test]
async fn full_subscriber_buffer_drops_oldest_without_blocking_ticks() {
    let kernel = Kernel::new(KernelConfig::default());
    let handle = kernel.subscribe(2);
    kernel.enqueue(Command::Start).await.unwrap();

    for _ in 0..6 {
        kernel.tick().await;
    }

    let latest = kernel.get_latest_snapshot().unwrap();
    assert_eq!(latest.step_index, 6, "all six ticks must have executed despite the stalled subscriber");

    let drops = latest
        .publisher_stats
        .subscriber_drops
        .iter()
        .find(|(id, _)| *id == handle.id())
        .map(|(_, count)| *count)
        .unwrap_or(0);
    assert!(drops >= 4, "buffer of size 2 fed 6 snapshots should drop at least 4, got {drops}");

    // The subscriber can still catch up on what remains in its buffer.
    let first_remaining = handle.recv().await;
    let second_remaining = handle.recv().await;
    assert!(first_remaining.step_index < second_remaining.step_index);
}

#[tokio::test]
async fn unsubscribed_handle_stops_accumulating_drops() {
    let kernel = Kernel::new(KernelConfig::default());
    let handle = kernel.subscribe(1);
    kernel.unsubscribe(&handle);

    kernel.enqueue(Command::Start).await.unwrap();
    for _ in 0..4 {
        kernel.tick().await;
    }
    let latest = kernel.get_latest_snapshot().unwrap();
    assert!(latest.publisher_stats.subscriber_drops.iter().all(|(id, _)| *id != handle.id()));
}

#[tokio::test]
async fn multiple_subscribers_each_receive_independent_streams() {
    let kernel = Kernel::new(KernelConfig::default());
    let fast = kernel.subscribe(8);
    let slow = kernel.subscribe(1);

    kernel.enqueue(Command::Start).await.unwrap();
    for _ in 0..3 {
        kernel.tick().await;
    }

    let mut fast_count = 0;
    while let Ok(snap) = tokio::time::timeout(std::time::Duration::from_millis(10), fast.recv()).await {
        fast_count += 1;
        let _ = snap;
    }
    assert_eq!(fast_count, 3, "a buffer large enough for every tick should not drop any");

    let latest = kernel.get_latest_snapshot().unwrap();
    let slow_drops = latest
        .publisher_stats
        .subscriber_drops
        .iter()
        .find(|(id, _)| *id == slow.id())
        .map(|(_, count)| *count)
        .unwrap_or(0);
    assert!(slow_drops >= 2);
}
