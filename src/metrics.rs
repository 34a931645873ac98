//! Prometheus metrics for the ski-tracking core.
//!
//! Exposed on an HTTP endpoint alongside `/health` (see [`crate::http`]).

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref PINGS_ACCEPTED: IntCounter = IntCounter::new(
        "ski_pings_accepted_total",
        "Location pings accepted past validation and throttle"
    ).unwrap();

    pub static ref PINGS_THROTTLED: IntCounter = IntCounter::new(
        "ski_pings_throttled_total",
        "Location pings rejected by the 1s throttle"
    ).unwrap();

    pub static ref PINGS_REJECTED: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("ski_pings_rejected_total", "Location pings rejected by validation or a downstream failure"),
        &["reason"]
    ).unwrap();

    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "ski_active_sessions",
        "Currently active ski sessions"
    ).unwrap();

    pub static ref CONNECTED_USERS: IntGauge = IntGauge::new(
        "ski_connected_users",
        "Currently connected users on this node"
    ).unwrap();

    pub static ref FANOUT_DELIVERED: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("ski_fanout_delivered_total", "Location fan-out frames delivered"),
        &["kind"]
    ).unwrap();

    pub static ref CHAT_MESSAGES_SENT: IntCounter = IntCounter::new(
        "ski_chat_messages_sent_total",
        "Chat messages successfully persisted and published"
    ).unwrap();

    pub static ref CHAT_CACHE_REFILLS: IntCounter = IntCounter::new(
        "ski_chat_cache_refills_total",
        "Times chat:history fell through to WARM and refilled the HOT cache"
    ).unwrap();

    pub static ref BATCH_FLUSHES: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("ski_batch_flushes_total", "PingPersister batch flush attempts"),
        &["outcome"]
    ).unwrap();

    pub static ref HOT_CALL_LATENCY: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new("ski_hot_call_latency_seconds", "HOT datastore call latency"),
        &["op"]
    ).unwrap();

    pub static ref WARM_CALL_LATENCY: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new("ski_warm_call_latency_seconds", "WARM store call latency"),
        &["op"]
    ).unwrap();

    pub static ref HOT_TIMEOUTS: IntCounter = IntCounter::new(
        "ski_hot_timeouts_total",
        "HOT datastore calls that exceeded the configured timeout"
    ).unwrap();

    pub static ref WARM_TIMEOUTS: IntCounter = IntCounter::new(
        "ski_warm_timeouts_total",
        "WARM store calls that exceeded the configured timeout"
    ).unwrap();
}

/// Register every metric with the global registry. Must be called once at
/// startup before any metric is recorded.
pub fn init() {
    REGISTRY.register(Box::new(PINGS_ACCEPTED.clone())).unwrap();
    REGISTRY.register(Box::new(PINGS_THROTTLED.clone())).unwrap();
    REGISTRY.register(Box::new(PINGS_REJECTED.clone())).unwrap();
    REGISTRY.register(Box::new(ACTIVE_SESSIONS.clone())).unwrap();
    REGISTRY.register(Box::new(CONNECTED_USERS.clone())).unwrap();
    REGISTRY.register(Box::new(FANOUT_DELIVERED.clone())).unwrap();
    REGISTRY.register(Box::new(CHAT_MESSAGES_SENT.clone())).unwrap();
    REGISTRY.register(Box::new(CHAT_CACHE_REFILLS.clone())).unwrap();
    REGISTRY.register(Box::new(BATCH_FLUSHES.clone())).unwrap();
    REGISTRY.register(Box::new(HOT_CALL_LATENCY.clone())).unwrap();
    REGISTRY.register(Box::new(WARM_CALL_LATENCY.clone())).unwrap();
    REGISTRY.register(Box::new(HOT_TIMEOUTS.clone())).unwrap();
    REGISTRY.register(Box::new(WARM_TIMEOUTS.clone())).unwrap();
}

/// Render the registry in Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap_or_default()
}
