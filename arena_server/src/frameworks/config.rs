use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub fn http_port() -> u16 {
    parsed("ARENA_SERVER_PORT").unwrap_or(3000)
}

pub fn bind_addr() -> IpAddr {
    parsed("ARENA_BIND_ADDR").unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Overrides the tick interval from the gameplay tuning when set.
pub fn tick_interval_ms() -> Option<u64> {
    parsed::<u64>("ARENA_TICK_MS").filter(|ms| *ms > 0)
}

/// Fixed seed for names and shop draws; unset means entropy.
pub fn rng_seed() -> Option<u64> {
    parsed("ARENA_RNG_SEED")
}

pub const ARENA_COMMAND_CAPACITY: usize = 1024;
// Events queued per connection before new ones are dropped.
pub const CONNECTION_QUEUE_CAPACITY: usize = 256;
pub const ROOM_LIST_TIMEOUT: Duration = Duration::from_secs(2);
