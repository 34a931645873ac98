//! `ski_sessions` lifecycle against a real sqlite pool (spec §3 Session,
//! §4.2, §8 invariant 2 "at-most-one-active-session").

mod common;

#[tokio::test]
async fn starting_a_second_session_closes_the_first() {
    let (warm, _db) = common::warm().await;
    let sessions = warm.sessions();

    let first = sessions.start("s1", "u1", None, 1_000).await.unwrap();
    assert!(first.active);

    let second = sessions.start("s2", "u1", Some("vail"), 2_000).await.unwrap();
    assert!(second.active);
    assert_eq!(second.resort_id.as_deref(), Some("vail"));

    let first_reloaded = sessions.get("s1").await.unwrap().expect("s1 still exists");
    assert!(!first_reloaded.active);
    assert_eq!(first_reloaded.end_time, Some(2_000));

    let second_reloaded = sessions.get("s2").await.unwrap().expect("s2 still exists");
    assert!(second_reloaded.active);
    assert_eq!(second_reloaded.end_time, None);
}

#[tokio::test]
async fn ending_a_session_requires_ownership() {
    let (warm, _db) = common::warm().await;
    let sessions = warm.sessions();
    sessions.start("s1", "owner", None, 0).await.unwrap();

    let by_stranger = sessions.end("s1", "not-owner", 5_000).await.unwrap();
    assert!(by_stranger.is_none(), "a non-owner must not be able to end the session");

    let still_active = sessions.get("s1").await.unwrap().unwrap();
    assert!(still_active.active);
}

#[tokio::test]
async fn ending_a_session_stamps_end_time_and_deactivates() {
    let (warm, _db) = common::warm().await;
    let sessions = warm.sessions();
    sessions.start("s1", "u1", None, 1_000).await.unwrap();

    let ended = sessions.end("s1", "u1", 9_000).await.unwrap().expect("session existed");
    assert!(!ended.active);
    // `end` returns the pre-update snapshot with end_time/active patched in,
    // per its doc comment — the caller computes durationSeconds from this.
    assert_eq!(ended.start_time, 1_000);
    assert_eq!(ended.end_time, Some(9_000));

    // A second end on an already-inactive session is a no-op failure.
    assert!(sessions.end("s1", "u1", 10_000).await.unwrap().is_none());
}

#[tokio::test]
async fn apply_aggregates_accumulates_across_flushes() {
    let (warm, _db) = common::warm().await;
    let sessions = warm.sessions();
    sessions.start("s1", "u1", None, 0).await.unwrap();

    sessions.apply_aggregates("s1", 100.0, 10.0, 4.0).await.unwrap();
    sessions.apply_aggregates("s1", 50.0, 5.0, 6.0).await.unwrap();

    let session = sessions.get("s1").await.unwrap().unwrap();
    assert_eq!(session.total_distance_meters, 150.0);
    assert_eq!(session.total_vertical_meters, 15.0);
    // max_speed is a running MAX, not a sum: 4.0 then 6.0 -> 6.0, a later
    // lower candidate must not regress it.
    assert_eq!(session.max_speed_mps, 6.0);

    sessions.apply_aggregates("s1", 0.0, 0.0, 2.0).await.unwrap();
    let session = sessions.get("s1").await.unwrap().unwrap();
    assert_eq!(session.max_speed_mps, 6.0);
}
