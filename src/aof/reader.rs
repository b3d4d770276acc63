//! AOF Reader
//!
//! Streams records back out of the AOF file.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::error::Result;
use crate::protocol::{codec, Value};

/// Reads records from the AOF file in order
pub struct AofReader {
    reader: Counted<BufReader<File>>,

    /// End offset of the last complete record
    position: u64,
}

impl AofReader {
    /// Open an AOF file for reading from the start
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: Counted::new(BufReader::new(file)),
            position: 0,
        })
    }

    /// Read the next record.
    ///
    /// `Ok(None)` at a clean end of file. A record cut short by the end of
    /// the file is [`KvError::Incomplete`](crate::KvError::Incomplete).
    pub fn next_record(&mut self) -> Result<Option<Value>> {
        let record = codec::read_value(&mut self.reader)?;
        if record.is_some() {
            self.position = self.reader.count;
        }
        Ok(record)
    }

    /// Byte offset just past the last complete record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over the remaining records, stopping after the first error
    pub fn records(self) -> AofRecords {
        AofRecords {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over AOF records
pub struct AofRecords {
    reader: AofReader,
    done: bool,
}

impl Iterator for AofRecords {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Counts bytes consumed through either the Read or BufRead side
struct Counted<R> {
    inner: R,
    count: u64,
}

impl<R> Counted<R> {
    fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }
}

impl<R: Read> Read for Counted<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for Counted<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.count += amt as u64;
    }
}
