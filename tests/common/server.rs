//! In-process Gateway test harness: a real `Core` (HOT = a live Redis,
//! WARM = a throwaway sqlite file) served over an ephemeral TCP port, in
//! the style of the teacher's `tests/common/server.rs`
//! (`examples/sid3xyz-slircd-ng/tests/common/server.rs` spawns the real
//! daemon and binds an ephemeral port) — here the "daemon" is an `axum`
//! `Router` spawned in-process, following
//! `examples/zhubby-moltis/crates/gateway/tests/chat_ui.rs`'s
//! `TcpListener::bind("127.0.0.1:0")` + `axum::serve` pattern, since the
//! Gateway is a library router rather than its own subprocess.
//!
//! Requires a real Redis reachable at `SKI_TEST_REDIS_URL` (default
//! `redis://127.0.0.1:6379`); callers gate their tests `#[ignore]` and
//! run them explicitly with `cargo test -- --ignored`.

use ski_core::config::{Config, HotConfig, ServerConfig, TokenVerifierConfig, Tunables, WarmConfig};
use ski_core::state::Core;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

static NEXT_REDIS_DB: AtomicU8 = AtomicU8::new(1);

fn redis_base_url() -> String {
    std::env::var("SKI_TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

pub struct TestServer {
    pub ws_url: String,
    pub core: Arc<Core>,
    _warm_db: NamedTempFile,
}

/// Starts a Gateway with a dedicated logical Redis database (so
/// concurrently-running tests in this binary don't collide on the
/// process-wide `geo:users` key) and a fresh sqlite WARM store.
/// `tokens` maps bearer token -> userId (`TokenVerifierConfig::Static`).
pub async fn start(tokens: HashMap<String, String>) -> TestServer {
    let db_index = NEXT_REDIS_DB.fetch_add(1, Ordering::Relaxed) % 15 + 1;
    let warm_db = NamedTempFile::new().expect("create temp warm db");

    let config = Config {
        server: ServerConfig::default(),
        hot: HotConfig { endpoint: format!("{}/{db_index}", redis_base_url()), password: None, timeout_ms: 2_000 },
        warm: WarmConfig { dsn: format!("sqlite://{}", warm_db.path().display()), timeout_ms: 5_000 },
        token_verifier: TokenVerifierConfig::Static { tokens },
        tunables: Tunables::default(),
    };

    let core = Arc::new(
        Core::new(config)
            .await
            .expect("Core::new failed — is a local Redis reachable at SKI_TEST_REDIS_URL/redis://127.0.0.1:6379?"),
    );
    let app = ski_core::gateway::router(core.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local_addr");

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer { ws_url: format!("ws://{addr}/ws"), core, _warm_db: warm_db }
}
