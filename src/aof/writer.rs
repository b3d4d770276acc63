//! AOF Writer
//!
//! Handles appending records to the AOF file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::AofSyncStrategy;
use crate::error::Result;
use crate::protocol::{codec, Value};

/// Storage behind an [`AofWriter`]
///
/// Implemented for [`File`]; other implementations exist for tests that
/// need a write or an fsync to fail.
pub trait AofFile: Write {
    fn sync_data(&self) -> io::Result<()>;

    fn set_len(&self, size: u64) -> io::Result<()>;
}

impl AofFile for File {
    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&self, size: u64) -> io::Result<()> {
        File::set_len(self, size)
    }
}

/// Appends encoded records to the AOF file
pub struct AofWriter<F: AofFile = File> {
    file: F,
    path: PathBuf,
    sync_strategy: AofSyncStrategy,

    /// Bytes in the file, all of them complete records
    size: u64,

    /// Records appended by this writer
    records_written: u64,

    /// Records written since the last fsync
    unsynced: usize,
    last_sync: Instant,
}

impl AofWriter {
    /// Open or create an AOF file for appending
    pub fn open(path: &Path, sync_strategy: AofSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let size = file.metadata()?.len();

        tracing::debug!("Opened AOF {} ({} bytes)", path.display(), size);

        Ok(Self::from_file(file, path, sync_strategy, size))
    }
}

impl<F: AofFile> AofWriter<F> {
    /// Wrap an already open file whose current length is `size`.
    ///
    /// `file` must append: every write lands at the end.
    pub fn from_file(file: F, path: &Path, sync_strategy: AofSyncStrategy, size: u64) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
            sync_strategy,
            size,
            records_written: 0,
            unsynced: 0,
            last_sync: Instant::now(),
        }
    }

    /// Append a record to the end of the file.
    ///
    /// The record is handed to the OS before this returns. If the write
    /// fails part way, or the fsync the strategy calls for fails, the file
    /// is cut back to the previous record boundary and the record counts as
    /// never written.
    pub fn append(&mut self, record: &Value) -> Result<()> {
        let bytes = codec::encode(record);

        if let Err(e) = self.file.write_all(&bytes) {
            self.roll_back();
            return Err(e.into());
        }

        self.unsynced += 1;

        let due = match self.sync_strategy {
            AofSyncStrategy::EveryWrite => true,
            AofSyncStrategy::EverySecond => self.last_sync.elapsed() >= Duration::from_secs(1),
            AofSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            if let Err(e) = self.file.sync_data() {
                self.unsynced -= 1;
                self.roll_back();
                return Err(e.into());
            }
            self.unsynced = 0;
            self.last_sync = Instant::now();
        }

        self.size += bytes.len() as u64;
        self.records_written += 1;
        Ok(())
    }

    // Drop whatever the current append put past `size`
    fn roll_back(&mut self) {
        if let Err(e) = self.file.set_len(self.size) {
            tracing::error!(
                "Failed to roll back partial AOF record in {}: {}",
                self.path.display(),
                e
            );
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        if self.unsynced > 0 {
            self.file.sync_data()?;
            self.unsynced = 0;
        }
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Sync if anything was written since the last fsync.
    ///
    /// Returns whether an fsync happened.
    pub fn sync_if_dirty(&mut self) -> Result<bool> {
        if self.unsynced == 0 {
            return Ok(false);
        }
        self.sync()?;
        Ok(true)
    }

    /// Size of the file in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Records appended since the last fsync
    pub fn unsynced_entries(&self) -> usize {
        self.unsynced
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: AofFile> Drop for AofWriter<F> {
    fn drop(&mut self) {
        if let Err(e) = self.sync() {
            tracing::warn!("Failed to sync AOF {} on close: {}", self.path.display(), e);
        }
    }
}
