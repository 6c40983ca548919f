// Unit tests for the status polling task

use crate::engine::PollingTask;

use std::time::Duration;

#[tokio::test]
async fn given_running_task_when_period_elapses_then_ticks() {
    let (mut task, mut ticks) = PollingTask::start(Duration::from_millis(20));
    assert!(task.is_running());

    let tick = tokio::time::timeout(Duration::from_secs(1), ticks.recv()).await;

    assert_eq!(tick, Ok(Some(())));
    task.cancel();
}

/// **VALUE**: Cancel stops ticks and is safe to repeat.
///
/// **BUG THIS CATCHES**: Would catch a timer that keeps polling a torn-down
/// session, or a second cancel panicking.
#[tokio::test]
async fn given_running_task_when_cancelled_twice_then_stops_once() {
    let (mut task, mut ticks) = PollingTask::start(Duration::from_millis(10));

    assert!(task.cancel());
    assert!(!task.cancel());
    assert!(!task.is_running());

    // At most one tick was buffered before the abort; then the channel closes.
    let drained = tokio::time::timeout(Duration::from_secs(1), async {
        while ticks.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());
}
