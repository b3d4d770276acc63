//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polled for shutdown)
//! - One worker thread per connection, up to `max_connections`
//! - Requests routed through the shared Engine

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
