//! Network Module
//!
//! TCP request layer over the engine's core API.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - One thread per connection, capped by `max_connections`
//! - Commands routed through `Engine::execute`

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
