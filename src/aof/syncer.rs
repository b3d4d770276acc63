//! Background fsync for the `EverySecond` strategy
//!
//! Appends under `EverySecond` only write to the OS. This thread fsyncs the
//! file on a fixed tick whenever something is pending, so an acknowledged
//! write reaches the disk within one interval even if no further writes
//! arrive.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;

use crate::error::Result;
use super::AofWriter;

/// Tick of the background syncer under `EverySecond`
pub const SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the background sync thread.
///
/// Dropping the handle stops the thread and waits for it.
pub struct AofSyncer {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AofSyncer {
    /// Start fsyncing `writer` every `interval` while it has unsynced records
    pub fn spawn(writer: Arc<Mutex<AofWriter>>, interval: Duration) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let ticker = channel::tick(interval);

        let handle = thread::Builder::new()
            .name("aof-sync".to_string())
            .spawn(move || loop {
                channel::select! {
                    recv(ticker) -> _ => {
                        // The lock is held only for the fsync itself
                        let mut writer = writer.lock();
                        if let Err(e) = writer.sync_if_dirty() {
                            tracing::warn!(
                                "Background fsync of {} failed: {}",
                                writer.path().display(),
                                e
                            );
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            })?;

        tracing::debug!("AOF syncer started ({:?} interval)", interval);

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl Drop for AofSyncer {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the select
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("AOF syncer thread panicked");
            }
        }
    }
}
