//! Keyspace Module
//!
//! The in-memory data behind every command.
//!
//! ## Responsibilities
//! - Flat store: key → value
//! - Hash store: hash name → (field → value)
//! - Enforce the locking discipline between the two stores
//!
//! ## Locking
//! Each store has its own `RwLock`. Operations touching one store take only
//! that store's lock. Operations touching both (DEL, EXISTS) always lock
//! the flat store first and release it last.
//!
//! ## Invariant
//! A hash name is present iff it holds at least one field. Removing the
//! last field removes the hash.

mod store;

pub use store::Keyspace;

/// Field → value map of a single hash
pub type Hash = std::collections::HashMap<bytes::Bytes, bytes::Bytes>;
