//! Engine Module
//!
//! Ties the keyspace, the command table and the AOF together.
//!
//! ## Responsibilities
//! - Replay the AOF on open, before anything else can touch the keyspace
//! - Log mutating requests before executing them
//! - Serve as the single execution path for live traffic and replay

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::aof::{self, AofSyncer, AofWriter, ReplayResult};
use crate::command::{self, Command};
use crate::config::{AofSyncStrategy, Config};
use crate::error::Result;
use crate::keyspace::Keyspace;
use crate::protocol::{Request, Value};

/// The main storage engine
///
/// ## Concurrency Model
///
/// - **Keyspace**: two independent RwLocks (flat, hash); see
///   [`keyspace`](crate::keyspace) for the lock order.
/// - **AOF**: its own Mutex, so records never interleave. It is released
///   before the keyspace is touched; no lock is held across both. Under
///   `EverySecond` a background [`AofSyncer`] takes the same Mutex to fsync.
///
/// Log order across connections may differ from keyspace order. Each
/// record is self-contained, so replay still converges.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Flat and hash stores
    keyspace: Keyspace,

    /// Append-only log; `None` for in-memory engines
    aof: Option<Arc<Mutex<AofWriter>>>,

    /// Background fsync, running only under `EverySecond`
    syncer: Option<AofSyncer>,
}

impl Engine {
    /// Open an engine with the given config
    ///
    /// On startup:
    /// 1. Create the AOF's parent directory if needed
    /// 2. Replay the AOF into an empty keyspace
    /// 3. Open the AOF for appending
    /// 4. Start the background syncer if the strategy is `EverySecond`
    pub fn open(config: Config) -> Result<Self> {
        if let Some(parent) = config.aof_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut engine = Self {
            config,
            keyspace: Keyspace::new(),
            aof: None,
            syncer: None,
        };

        let aof_path = engine.config.aof_path.clone();
        let result = engine.replay(&aof_path)?;
        tracing::info!(
            "AOF replay: {} records applied, {} skipped, {} bytes{}",
            result.records_applied,
            result.records_skipped,
            result.valid_bytes,
            if result.was_truncated { ", partial tail removed" } else { "" }
        );

        let writer = Arc::new(Mutex::new(AofWriter::open(
            &aof_path,
            engine.config.aof_sync_strategy,
        )?));
        if engine.config.aof_sync_strategy == AofSyncStrategy::EverySecond {
            engine.syncer = Some(AofSyncer::spawn(Arc::clone(&writer), aof::SYNC_INTERVAL)?);
        }
        engine.aof = Some(writer);

        Ok(engine)
    }

    /// Open with an AOF path (convenience method)
    ///
    /// Uses default config with the given AOF path
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().aof_path(path).build())
    }

    /// An engine with no AOF. Nothing survives a restart.
    pub fn in_memory() -> Self {
        Self {
            config: Config::default(),
            keyspace: Keyspace::new(),
            aof: None,
            syncer: None,
        }
    }

    /// Execute a live request
    ///
    /// Unknown commands and bad arity are answered with an error reply and
    /// never logged. Mutating requests are appended to the AOF before the
    /// keyspace is touched; if the append fails, the request is not applied
    /// and the error is returned.
    pub fn execute(&self, request: &Request) -> Result<Value> {
        let Some(command) = Command::lookup(request.name()) else {
            tracing::debug!(
                "Unknown command: {}",
                String::from_utf8_lossy(request.name())
            );
            return Ok(command::unknown_command(request.name()));
        };

        if !command.arity().accepts(request.args().len()) {
            return Ok(command::wrong_arity(command));
        }

        if command.is_write() {
            if let Some(aof) = &self.aof {
                aof.lock().append(&request.to_value())?;
            }
        }

        tracing::trace!("Executing {} with {} args", command.name(), request.args().len());
        Ok(command.execute(&self.keyspace, request.args()))
    }

    /// Apply a request without logging it
    pub fn apply(&self, request: &Request) -> Value {
        command::dispatch(&self.keyspace, request)
    }

    /// Replay an AOF file into this engine without writing to any log
    pub fn replay(&self, path: &Path) -> Result<ReplayResult> {
        aof::replay(path, |record| match Request::from_value(record) {
            Ok(request) => self.apply(&request),
            Err(e) => Value::error(format!("ERR invalid request: {}", e)),
        })
    }

    /// Force the AOF to disk
    pub fn sync(&self) -> Result<()> {
        if let Some(aof) = &self.aof {
            aof.lock().sync()?;
        }
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Stops the background syncer, then syncs the AOF to disk
    pub fn close(mut self) -> Result<()> {
        drop(self.syncer.take());
        self.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Whether mutations are being logged
    pub fn aof_enabled(&self) -> bool {
        self.aof.is_some()
    }

    /// Records appended to the AOF since open
    pub fn aof_records_written(&self) -> u64 {
        self.aof.as_ref().map_or(0, |aof| aof.lock().records_written())
    }

    /// Records appended but not yet fsynced
    pub fn aof_unsynced_entries(&self) -> usize {
        self.aof.as_ref().map_or(0, |aof| aof.lock().unsynced_entries())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
