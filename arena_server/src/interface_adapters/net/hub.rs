// Fan-out of arena events to live sockets. Each event is serialized once and the shared bytes
// are queued on every recipient's connection channel.

use crate::domain::PlayerId;
use crate::interface_adapters::net::client::{should_log, throttle_start};
use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::{EventSink, Outbound};
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

pub struct ConnectionHub {
    connections: Mutex<HashMap<PlayerId, mpsc::Sender<Utf8Bytes>>>,
    last_full_log: Mutex<Instant>,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            last_full_log: Mutex::new(throttle_start()),
        }
    }

    pub fn attach(&self, player_id: PlayerId, tx: mpsc::Sender<Utf8Bytes>) {
        lock(&self.connections).insert(player_id, tx);
    }

    pub fn detach(&self, player_id: PlayerId) -> bool {
        lock(&self.connections).remove(&player_id).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.connections).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A panic while holding the lock cannot leave the map half-updated, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EventSink for ConnectionHub {
    fn deliver(&self, batch: Vec<Outbound>) {
        let connections = lock(&self.connections);
        for outbound in batch {
            let message = ServerMessage::from(outbound.event);
            let bytes = match serde_json::to_string(&message) {
                Ok(txt) => Utf8Bytes::from(txt),
                Err(e) => {
                    error!(error = ?e, "failed to serialize server event");
                    continue;
                }
            };

            for player_id in &outbound.recipients {
                let Some(tx) = connections.get(player_id) else {
                    continue;
                };
                match tx.try_send(bytes.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        if should_log(&mut lock(&self.last_full_log)) {
                            warn!(player_id = %player_id, "connection queue full; dropping event");
                        }
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(player_id = %player_id, "connection gone; dropping event");
                    }
                }
            }
        }
    }
}
