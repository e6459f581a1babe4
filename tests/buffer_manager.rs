use collector_buffer::{BufferError, BufferManager};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn reads_for_an_unregistered_handler_fail_without_blocking() {
    let manager = BufferManager::<i32>::new(5).unwrap();

    let err = timeout(Duration::from_secs(1), manager.next_event("ghost"))
        .await
        .expect("must fail immediately")
        .unwrap_err();
    assert_eq!(err, BufferError::UnknownHandler("ghost".into()));

    let err = manager.next_events("ghost", 3).await.unwrap_err();
    assert_eq!(err, BufferError::UnknownHandler("ghost".into()));
}

#[tokio::test]
async fn re_registering_a_live_handler_is_rejected() {
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("writer").await.unwrap();

    let err = manager.add_handler("writer").await.unwrap_err();
    assert_eq!(err, BufferError::DuplicateHandler("writer".into()));

    // After removal the id is free again.
    assert!(manager.remove_handler("writer").await);
    manager.add_handler("writer").await.unwrap();
}

#[tokio::test]
async fn remove_handler_is_idempotent() {
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("writer").await.unwrap();

    assert!(manager.remove_handler("writer").await);
    assert!(!manager.remove_handler("writer").await);
    assert!(!manager.is_registered("writer").await);

    // The failure point is the subsequent read, not the removal.
    let err = manager.next_event("writer").await.unwrap_err();
    assert_eq!(err, BufferError::UnknownHandler("writer".into()));
}

#[tokio::test]
async fn handlers_see_only_events_added_after_registration() {
    let manager = BufferManager::<i32>::new(10).unwrap();
    manager.add(1).await;
    manager.add(2).await;

    manager.add_handler("late").await.unwrap();
    manager.add(3).await;

    assert_eq!(manager.next_event("late").await.unwrap(), 3);
}

#[tokio::test]
async fn cursors_are_isolated_between_handlers() {
    // Worked example: capacity 5, values 0..=6. A handler reading five
    // times ends on 6; one reading only three times ends on 4.
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("steady").await.unwrap();
    manager.add_handler("lagging").await.unwrap();
    for v in 0..7 {
        manager.add(v).await;
    }

    let mut last = 0;
    for _ in 0..5 {
        last = manager.next_event("steady").await.unwrap();
    }
    assert_eq!(last, 6);

    let mut last = 0;
    for _ in 0..3 {
        last = manager.next_event("lagging").await.unwrap();
    }
    assert_eq!(last, 4);
}

#[tokio::test]
async fn a_slow_handler_skips_evicted_events() {
    let manager = BufferManager::<i32>::new(3).unwrap();
    manager.add_handler("slow").await.unwrap();
    for v in 0..6 {
        manager.add(v).await;
    }

    // Seqs 1..=3 were evicted; the cursor clamps forward to seq 4.
    assert_eq!(manager.next_event("slow").await.unwrap(), 3);
    assert_eq!(manager.next_event("slow").await.unwrap(), 4);
}

#[tokio::test]
async fn bulk_reads_advance_the_cursor_past_the_batch() {
    let manager = BufferManager::<i32>::new(10).unwrap();
    manager.add_handler("batch").await.unwrap();
    for v in 0..5 {
        manager.add(v).await;
    }

    assert_eq!(manager.next_events("batch", 3).await.unwrap(), vec![0, 1, 2]);
    assert_eq!(manager.next_events("batch", 10).await.unwrap(), vec![3, 4]);

    manager.add(5).await;
    assert_eq!(manager.next_event("batch").await.unwrap(), 5);
}

#[tokio::test]
async fn a_blocked_read_is_woken_by_a_later_add() {
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("waiter").await.unwrap();

    let reader = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.next_event("waiter").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!reader.is_finished());

    manager.add(11).await;
    let value = timeout(Duration::from_secs(1), reader)
        .await
        .expect("add must wake the handler")
        .unwrap()
        .unwrap();
    assert_eq!(value, 11);
}

#[tokio::test]
async fn a_cancelled_read_does_not_advance_the_cursor() {
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("reader").await.unwrap();

    let cancelled = timeout(Duration::from_millis(50), manager.next_event("reader")).await;
    assert!(cancelled.is_err());

    // The same event is delivered by the next read.
    manager.add(5).await;
    assert_eq!(manager.next_event("reader").await.unwrap(), 5);
}

#[tokio::test]
async fn one_blocked_handler_does_not_stall_the_others() {
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("blocked").await.unwrap();

    let blocked: Arc<BufferManager<i32>> = manager.clone();
    let waiter = tokio::spawn(async move { blocked.next_event("blocked").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Registration and removal proceed while the read is parked.
    manager.add_handler("other").await.unwrap();
    assert!(manager.remove_handler("other").await);

    manager.add(1).await;
    assert_eq!(waiter.await.unwrap().unwrap(), 1);
}

#[tokio::test]
async fn a_handler_removed_mid_read_gets_unknown_handler() {
    let manager = BufferManager::<i32>::new(5).unwrap();
    manager.add_handler("doomed").await.unwrap();

    let doomed = manager.clone();
    let reader = tokio::spawn(async move { doomed.next_event("doomed").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(manager.remove_handler("doomed").await);
    manager.add(1).await;

    let err = timeout(Duration::from_secs(1), reader)
        .await
        .unwrap()
        .unwrap()
        .unwrap_err();
    assert_eq!(err, BufferError::UnknownHandler("doomed".into()));
}
