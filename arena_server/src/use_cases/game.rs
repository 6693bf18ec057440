use super::arena::Arena;
use super::types::{ArenaCommand, EventSink, Outbox};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Drives the arena: applies commands as they arrive and fires timers when they come due.
///
/// Both paths run to completion before the next one starts, so room state is never touched
/// concurrently. The task ends when every command sender is gone.
pub async fn arena_task(
    mut arena: Arena,
    mut commands: mpsc::Receiver<ArenaCommand>,
    sink: Arc<dyn EventSink>,
) {
    let started = Instant::now();
    let now_ms = || started.elapsed().as_millis() as u64;
    info!(
        tick_ms = arena.tuning().matches.tick_interval_ms,
        max_players = arena.tuning().matches.max_players,
        "arena task started"
    );

    loop {
        let deadline = arena
            .next_deadline()
            .map(|due_ms| started + Duration::from_millis(due_ms));

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                let outbox = arena.handle_command(command, now_ms());
                deliver(sink.as_ref(), outbox);
            }
            _ = sleep_until(deadline) => {
                let outbox = arena.fire_due(now_ms());
                deliver(sink.as_ref(), outbox);
            }
        }
    }

    info!("arena task stopped");
}

fn deliver(sink: &dyn EventSink, outbox: Outbox) {
    if outbox.is_empty() {
        return;
    }
    let batch = outbox.into_vec();
    debug!(events = batch.len(), "delivering events");
    sink.deliver(batch);
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
