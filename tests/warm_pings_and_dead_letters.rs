//! `location_pings` batch insert (spec §4.3 step 2 "in one WARM call")
//! and `job_dead_letters` (spec §9 "retry discipline").

mod common;

use ski_core::model::Ping;

fn ping(session_id: &str, t: i64) -> Ping {
    Ping {
        session_id: session_id.to_string(),
        user_id: "u1".to_string(),
        lon: -105.9538,
        lat: 39.6042,
        altitude_meters: 2800.0,
        speed_mps: 4.0,
        accuracy_meters: 5.0,
        heading_degrees: None,
        captured_at: t,
    }
}

#[tokio::test]
async fn insert_batch_writes_every_row() {
    let (warm, _db) = common::warm().await;
    warm.sessions().start("s1", "u1", None, 0).await.unwrap();

    let batch = vec![ping("s1", 0), ping("s1", 1000), ping("s1", 2000)];
    warm.pings().insert_batch(&batch).await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM location_pings WHERE session_id = 's1'")
        .fetch_one(warm.pool())
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn insert_batch_tolerates_an_empty_batch() {
    let (warm, _db) = common::warm().await;
    warm.pings().insert_batch(&[]).await.unwrap();
}

#[tokio::test]
async fn dead_letter_insert_is_queryable() {
    let (warm, _db) = common::warm().await;
    warm.dead_letters().insert("location.ping", "{\"sessionId\":\"s1\"}", "warm timeout", 12_345).await.unwrap();

    let (topic, last_error): (String, String) =
        sqlx::query_as("SELECT topic, last_error FROM job_dead_letters WHERE topic = 'location.ping'")
            .fetch_one(warm.pool())
            .await
            .unwrap();
    assert_eq!(topic, "location.ping");
    assert_eq!(last_error, "warm timeout");
}
