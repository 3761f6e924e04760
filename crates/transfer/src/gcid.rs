use std::fmt;
use std::io::Read;
use std::path::Path;

use sha1::{Digest, Sha1};
use tracing::debug;

use crate::TransferError;
use crate::chunked::read_full;

/// Smallest GCID chunk: 256 KiB.
pub const MIN_CHUNK_SIZE: u64 = 0x40000;

/// Largest GCID chunk: 2 MiB.
pub const MAX_CHUNK_SIZE: u64 = 0x200000;

/// Chunk count above which the chunk size doubles.
const MAX_CHUNKS: u64 = 0x200;

/// Content digest used by the drive service as a dedup key.
///
/// Always 40 uppercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GcidDigest(String);

impl GcidDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for GcidDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GcidDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Picks the GCID chunk size for a file of `byte_size` bytes.
///
/// Starts at 256 KiB and doubles while the file would still span more than
/// 512 chunks, capped at 2 MiB. The comparison is `size / psize > 512` over
/// the reals, written multiplicatively so a single extra byte past the
/// boundary already doubles.
pub fn select_chunk_size(byte_size: u64) -> u64 {
    let mut psize = MIN_CHUNK_SIZE;
    while byte_size > MAX_CHUNKS * psize && psize < MAX_CHUNK_SIZE {
        psize <<= 1;
    }
    psize
}

/// Computes the GCID of `byte_size` bytes read sequentially from `reader`.
///
/// Each chunk is hashed with SHA-1 and the raw 20-byte digests are fed into
/// an outer SHA-1. Fails with [`TransferError::SizeMismatch`] if the reader
/// yields a different number of bytes than announced.
pub fn gcid_hash_reader<R: Read>(
    reader: R,
    byte_size: u64,
) -> Result<GcidDigest, TransferError> {
    gcid_hash_reader_until(reader, byte_size, || false)
}

/// Like [`gcid_hash_reader`], but polls `is_cancelled` before every chunk
/// and stops with [`TransferError::Cancelled`] once it returns `true`.
pub fn gcid_hash_reader_until<R: Read>(
    mut reader: R,
    byte_size: u64,
    is_cancelled: impl Fn() -> bool,
) -> Result<GcidDigest, TransferError> {
    let chunk_size = select_chunk_size(byte_size) as usize;
    let mut outer = Sha1::new();
    let mut buf = vec![0u8; chunk_size];
    let mut total: u64 = 0;
    let mut chunks: u64 = 0;

    loop {
        if is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        let n = read_full(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        outer.update(Sha1::digest(&buf[..n]));
        total += n as u64;
        chunks += 1;
    }

    if total != byte_size {
        return Err(TransferError::SizeMismatch {
            expected: byte_size,
            actual: total,
        });
    }

    debug!(bytes = total, chunks, chunk_size, "gcid computed");
    Ok(GcidDigest(hex::encode_upper(outer.finalize())))
}

/// Computes the GCID of the file at `path`.
pub fn gcid_hash_file(path: &Path) -> Result<GcidDigest, TransferError> {
    let file = std::fs::File::open(path)?;
    let byte_size = file.metadata()?.len();
    gcid_hash_reader(file, byte_size)
}
