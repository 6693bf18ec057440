use crate::domain::PlayerId;
use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

fn counter() -> &'static AtomicU64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    // Seeded from the clock so ids from a restarted process do not repeat recent ones.
    COUNTER.get_or_init(|| AtomicU64::new(now_micros()))
}

/// Process-unique id for log correlation of one socket.
pub fn next_conn_id() -> u64 {
    counter().fetch_add(1, Ordering::Relaxed)
}

/// Transient identity handed to a new connection; never reused within the process.
pub fn next_player_id() -> PlayerId {
    PlayerId(next_conn_id())
}
