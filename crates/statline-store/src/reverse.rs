//! Backward line reading over fixed-size tail chunks.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Default chunk size for tail reads.
const CHUNK_SIZE: u64 = 8 * 1024;

/// Yields a file's lines newest-first without materializing the file.
///
/// Reads fixed-size chunks starting from the end. A partial line at a
/// chunk boundary is carried over and completed by the next (earlier)
/// chunk, so lines longer than one chunk still come out whole.
pub(crate) struct ReverseLines {
    file: File,
    /// File offset one past the region not yet read.
    remaining: u64,
    chunk_size: u64,
    /// Complete lines from the region read so far, in file order.
    pending: Vec<Vec<u8>>,
    /// Head bytes of the earliest read chunk, possibly a line tail.
    carry: Vec<u8>,
}

impl ReverseLines {
    pub(crate) fn open(path: &Path) -> std::io::Result<Self> {
        Self::with_chunk_size(path, CHUNK_SIZE)
    }

    /// Small chunk sizes exercise the boundary handling in tests.
    pub(crate) fn with_chunk_size(path: &Path, chunk_size: u64) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let remaining = file.metadata()?.len();
        Ok(Self {
            file,
            remaining,
            chunk_size: chunk_size.max(1),
            pending: Vec::new(),
            carry: Vec::new(),
        })
    }

    fn refill(&mut self) -> std::io::Result<()> {
        let size = self.chunk_size.min(self.remaining);
        self.remaining -= size;
        self.file.seek(SeekFrom::Start(self.remaining))?;

        #[expect(
            clippy::cast_possible_truncation,
            reason = "bounded by the chunk size"
        )]
        let mut buf = vec![0_u8; size as usize];
        self.file.read_exact(&mut buf)?;
        buf.append(&mut self.carry);

        let mut segments = buf.split(|&b| b == b'\n');
        let head = segments.next().unwrap_or_default().to_vec();
        self.pending.extend(segments.map(<[u8]>::to_vec));
        if self.remaining == 0 {
            self.pending.insert(0, head);
        } else {
            self.carry = head;
        }
        Ok(())
    }
}

impl Iterator for ReverseLines {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(line) = self.pending.pop() {
                return Some(Ok(line));
            }
            if self.remaining == 0 {
                return None;
            }
            if let Err(e) = self.refill() {
                // Tail offsets are untrustworthy after a read failure.
                self.remaining = 0;
                return Some(Err(e));
            }
        }
    }
}
