//! # respkv
//!
//! A small in-memory key-value store with:
//! - A RESP-style wire protocol (simple strings, errors, integers, bulk strings, arrays)
//! - Flat string keys and nested hashes, each behind its own RwLock
//! - An append-only log (AOF) replayed through the live command path on startup
//! - A thread-per-connection TCP server
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one worker thread per client)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  protocol::codec (decode / encode)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │        validate → log if mutating → dispatch → reply         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     AOF     │          │  Keyspace   │
//!   │  (Append)   │          │ flat │ hash │
//!   └──────┬──────┘          └──────▲──────┘
//!          │      replay on open    │
//!          └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod keyspace;
pub mod command;
pub mod aof;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use protocol::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of respkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
