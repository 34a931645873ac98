//! Shared fixtures for the integration tests, in the teacher's
//! `tests/common` style (`examples/sid3xyz-slircd-ng/tests/common/mod.rs`):
//! small helper modules re-exported by each test binary.

pub mod client;
pub mod server;

use ski_core::config::WarmConfig;
use ski_core::warm::WarmClient;
use tempfile::NamedTempFile;

/// A fresh sqlite-backed `WarmClient` on a throwaway file (not
/// `sqlite::memory:` — the pool has multiple connections and an
/// in-memory database isn't shared across them). Mirrors the teacher's
/// `create_test_db() -> (Arc<Database>, TempDir)` fixture shape
/// (`examples/sid3xyz-slircd-ng/src/db/always_on.rs`): the temp file is
/// returned alongside the client so the caller keeps it alive for the
/// duration of the test instead of it being deleted on drop.
pub async fn warm() -> (WarmClient, NamedTempFile) {
    let file = NamedTempFile::new().expect("create temp db file");
    let config = WarmConfig { dsn: format!("sqlite://{}", file.path().display()), timeout_ms: 5_000 };
    let client = WarmClient::connect(&config).await.expect("connect warm client");
    (client, file)
}

pub async fn seed_user(warm: &WarmClient, id: &str, display_name: &str) {
    sqlx::query("INSERT INTO users (id, display_name) VALUES (?, ?)")
        .bind(id)
        .bind(display_name)
        .execute(warm.pool())
        .await
        .expect("seed user");
}

pub async fn seed_friendship(warm: &WarmClient, user_a: &str, user_b: &str, status: &str) {
    sqlx::query("INSERT INTO friendships (user_a, user_b, status) VALUES (?, ?, ?)")
        .bind(user_a)
        .bind(user_b)
        .bind(status)
        .execute(warm.pool())
        .await
        .expect("seed friendship");
}

pub async fn seed_group_member(warm: &WarmClient, group_id: &str, user_id: &str) {
    sqlx::query("INSERT INTO group_members (group_id, user_id) VALUES (?, ?)")
        .bind(group_id)
        .bind(user_id)
        .execute(warm.pool())
        .await
        .expect("seed group member");
}
