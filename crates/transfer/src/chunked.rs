use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::types::Part;
use crate::{DEFAULT_PART_SIZE, TransferError};

/// Fills `buf` from `reader`, returning fewer bytes only at EOF.
///
/// A single `read` may return a short count before EOF; both the GCID and
/// the part boundaries depend on chunks being exactly `buf.len()` long.
pub fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// PartReader
// ---------------------------------------------------------------------------

/// Reads a file as consecutive, 1-based numbered parts of a fixed size.
///
/// Every part but the last is exactly `part_size` bytes; an empty file
/// yields no parts at all.
pub struct PartReader {
    file: std::fs::File,
    part_size: usize,
    next_number: u32,
    offset: u64,
    file_size: u64,
}

impl PartReader {
    /// Opens `path` for part-wise reading.
    ///
    /// If `part_size` is 0, [`DEFAULT_PART_SIZE`] (5 MiB) is used.
    pub fn open(path: &Path, part_size: usize) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        let part_size = if part_size == 0 {
            DEFAULT_PART_SIZE
        } else {
            part_size
        };
        Ok(Self {
            file,
            part_size,
            next_number: 1,
            offset: 0,
            file_size,
        })
    }

    /// Reads the next part. Returns `None` at EOF.
    pub fn next_part(&mut self) -> Result<Option<Part>, TransferError> {
        let mut buf = vec![0u8; self.part_size];
        let n = read_full(&mut self.file, &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);

        let part = Part {
            number: self.next_number,
            offset: self.offset,
            data: buf,
        };
        self.next_number += 1;
        self.offset += n as u64;
        Ok(Some(part))
    }

    /// Current byte offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// File size sampled when the reader was opened.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn part_size(&self) -> usize {
        self.part_size
    }

    /// Number of parts handed out so far.
    pub fn parts_read(&self) -> u32 {
        self.next_number - 1
    }
}
