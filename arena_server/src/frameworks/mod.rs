// Frameworks: process bootstrap and runtime configuration.

pub mod config;
pub mod server;
