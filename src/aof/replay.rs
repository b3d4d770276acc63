//! AOF Replay
//!
//! Rebuilds state on startup by feeding every record back through the
//! command path.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::{KvError, Result};
use crate::protocol::Value;
use super::AofReader;

/// Result of a replay or verify pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayResult {
    /// Records that executed successfully
    pub records_applied: u64,

    /// Records rejected by the command path (unknown command, bad arity,
    /// not a request) and skipped
    pub records_skipped: u64,

    /// Length of the well-formed prefix of the file
    pub valid_bytes: u64,

    /// Whether the file ended in a partial record
    pub was_truncated: bool,
}

/// Replay every record in `path`, in file order.
///
/// `apply` receives each decoded record and returns the reply it produced;
/// an error reply counts the record as skipped and replay continues. A
/// partial record at the end of the file is cut off so later appends start
/// on a record boundary. A malformed record anywhere else is
/// [`KvError::AofCorruption`]. A missing file replays nothing.
pub fn replay<F>(path: &Path, apply: F) -> Result<ReplayResult>
where
    F: FnMut(Value) -> Value,
{
    scan(path, apply, true)
}

/// Check the integrity of an AOF file without applying or modifying it
pub fn verify(path: &Path) -> Result<ReplayResult> {
    scan(path, |_| Value::ok(), false)
}

fn scan<F>(path: &Path, mut apply: F, repair: bool) -> Result<ReplayResult>
where
    F: FnMut(Value) -> Value,
{
    let mut result = ReplayResult::default();
    if !path.exists() {
        tracing::debug!("No AOF at {}, nothing to replay", path.display());
        return Ok(result);
    }

    let mut reader = AofReader::open(path)?;
    loop {
        let offset = reader.position();
        match reader.next_record() {
            Ok(Some(record)) => match apply(record) {
                Value::Error(message) => {
                    tracing::warn!("Skipping AOF record at offset {}: {}", offset, message);
                    result.records_skipped += 1;
                }
                _ => result.records_applied += 1,
            },
            Ok(None) => break,
            Err(KvError::Incomplete) => {
                result.was_truncated = true;
                if repair {
                    tracing::warn!(
                        "AOF {} ends with a partial record at offset {}, truncating",
                        path.display(),
                        offset
                    );
                    let file = OpenOptions::new().write(true).open(path)?;
                    file.set_len(offset)?;
                    file.sync_all()?;
                } else {
                    tracing::warn!(
                        "AOF {} ends with a partial record at offset {}",
                        path.display(),
                        offset
                    );
                }
                break;
            }
            Err(KvError::Protocol(message)) => {
                return Err(KvError::AofCorruption(format!(
                    "{}: record at offset {}: {}",
                    path.display(),
                    offset,
                    message
                )));
            }
            Err(e) => return Err(e),
        }
    }

    result.valid_bytes = reader.position();
    Ok(result)
}
