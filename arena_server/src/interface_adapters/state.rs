use crate::interface_adapters::net::hub::ConnectionHub;
use crate::use_cases::ArenaCommand;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Commands flowing from the network into the arena task.
    pub arena_tx: mpsc::Sender<ArenaCommand>,
    // Per-connection outbound queues, fed by the arena task.
    pub hub: Arc<ConnectionHub>,
}
