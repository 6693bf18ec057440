// Network adapter modules split by client sockets, event fan-out and plain HTTP routes.

pub mod client;
pub mod hub;
pub mod internal;

pub use client::ws_handler;
pub use hub::ConnectionHub;
pub use internal::{health_handler, list_rooms_handler};
