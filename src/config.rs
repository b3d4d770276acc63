//! Configuration for respkv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::KvError;

/// Main configuration for a respkv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // AOF Configuration
    // -------------------------------------------------------------------------
    /// Path of the append-only log. Replayed on open, appended to afterwards.
    pub aof_path: PathBuf,

    /// Sync strategy: how often to fsync the AOF
    pub aof_sync_strategy: AofSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// AOF sync strategy
///
/// Every append is flushed to the OS regardless of strategy, so a process
/// crash never loses an acknowledged write. The strategy only controls how
/// often the file is fsynced to survive a machine crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AofSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync at most once per second, checked on append
    EverySecond,

    /// fsync after N unsynced entries
    EveryNEntries { count: usize },
}

impl FromStr for AofSyncStrategy {
    type Err = KvError;

    /// Parses `always`, `everysec` or `every-<n>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(AofSyncStrategy::EveryWrite),
            "everysec" => Ok(AofSyncStrategy::EverySecond),
            other => other
                .strip_prefix("every-")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&count| count > 0)
                .map(|count| AofSyncStrategy::EveryNEntries { count })
                .ok_or_else(|| KvError::Config(format!("invalid fsync strategy: {}", s))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aof_path: PathBuf::from("database.aof"),
            aof_sync_strategy: AofSyncStrategy::EverySecond,
            listen_addr: "0.0.0.0:6371".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the append-only log path
    pub fn aof_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.aof_path = path.into();
        self
    }

    /// Set the AOF sync strategy
    pub fn aof_sync_strategy(mut self, strategy: AofSyncStrategy) -> Self {
        self.config.aof_sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
