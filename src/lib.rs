#![warn(clippy::pedantic, clippy::nursery)]
pub mod core;
pub mod server;
pub mod vis;
