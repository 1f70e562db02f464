use std::fs::File;
use std::io::{self, Read, Seek};

/// A seekable byte source a `BigBedRead` can read from.
///
/// Blanket-implemented for anything that is already `Read + Seek`; exists
/// as its own trait so the rest of the crate can refer to "the thing a
/// container reads from" without naming `Read + Seek` everywhere.
pub trait SeekableRead: Read + Seek {}
impl<T: Read + Seek> SeekableRead for T {}

/// A source that can produce an independent handle to the same underlying
/// data, positioned at the start.
///
/// `BigBedRead` keeps a single mutable cursor (see the crate's concurrency
/// notes); `reopen` is how a caller obtains a second, independently
/// positioned `BigBedRead` over the same file for use on another thread,
/// rather than sharing one cursor across threads.
pub trait Reopen: Sized {
    fn reopen(&self) -> io::Result<Self>;
}

/// A `File` that remembers the path it was opened from, so it can be
/// reopened independently of the original handle's cursor position.
pub struct ReopenableFile {
    pub path: String,
    pub file: File,
}

impl Read for ReopenableFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for ReopenableFile {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl Reopen for ReopenableFile {
    fn reopen(&self) -> io::Result<Self> {
        Ok(ReopenableFile {
            path: self.path.clone(),
            file: File::open(&self.path)?,
        })
    }
}
