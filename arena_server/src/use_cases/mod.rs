// Use cases layer: application workflows for the arena server.

pub mod actions;
pub mod arena;
pub mod game;
pub mod registry;
pub mod room;
pub mod scheduler;
pub mod shop;
pub mod tick;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use arena::Arena;
pub use game::arena_task;
pub use types::{ArenaCommand, ClientAction, EventSink, Outbound, ServerEvent};
