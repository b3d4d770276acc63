//! Append-Only File (AOF) Module
//!
//! Provides durability by logging every mutating request.
//!
//! ## Responsibilities
//! - Append each SET/HSET/DEL/HDEL request before it touches the keyspace
//! - fsync according to [`AofSyncStrategy`](crate::config::AofSyncStrategy),
//!   with a background thread for `EverySecond`
//! - Replay the whole file through the live dispatch path on startup
//! - Cut off a record torn by a crash mid-append
//!
//! ## File Format
//! Records are wire-encoded request arrays laid end to end, with no
//! header, separators or checksums:
//! ```text
//! *3\r\n$3\r\nSET\r\n$1\r\na\r\n$1\r\n1\r\n*4\r\n$4\r\nHSET\r\n ...
//! ```
//!
//! The file is never compacted, so replay time grows with the number of
//! writes over the lifetime of the data.

mod writer;
mod reader;
mod replay;
mod syncer;

pub use writer::{AofFile, AofWriter};
pub use reader::{AofReader, AofRecords};
pub use replay::{replay, verify, ReplayResult};
pub use syncer::{AofSyncer, SYNC_INTERVAL};
