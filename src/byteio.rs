use std::io::{self, Read, Seek, SeekFrom};

use byteordered::Endianness;

/// A primitive read that came up short, distinguished from an underlying
/// I/O failure so callers can report `TruncatedHeader`/`TruncatedNode`
/// instead of a generic I/O error.
pub(crate) enum ByteReadError {
    Truncated { expected: usize, got: usize },
    Io(io::Error),
}

impl From<io::Error> for ByteReadError {
    fn from(e: io::Error) -> Self {
        ByteReadError::Io(e)
    }
}

/// Reads `buf.len()` bytes from `reader`, returning `Truncated` instead of
/// an `io::Error` if the source runs out before the buffer is filled.
pub(crate) fn read_exact_checked<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), ByteReadError> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..])? {
            0 => {
                return Err(ByteReadError::Truncated {
                    expected: buf.len(),
                    got,
                })
            }
            n => got += n,
        }
    }
    Ok(())
}

/// An endian-aware primitive reader over a seekable byte source.
///
/// The byte order is fixed at construction and applies to every multi-byte
/// integer read through this type; string bytes and raw byte runs are read
/// verbatim and are byte-order invariant.
pub(crate) struct ByteReader<R> {
    inner: R,
    endianness: Endianness,
}

impl<R: Read + Seek> ByteReader<R> {
    pub(crate) fn new(inner: R, endianness: Endianness) -> Self {
        ByteReader { inner, endianness }
    }

    pub(crate) fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub(crate) fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ByteReadError> {
        let mut buf = [0u8; 1];
        read_exact_checked(&mut self.inner, &mut buf)?;
        Ok(buf[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ByteReadError> {
        let mut buf = [0u8; 2];
        read_exact_checked(&mut self.inner, &mut buf)?;
        Ok(match self.endianness {
            Endianness::Big => u16::from_be_bytes(buf),
            Endianness::Little => u16::from_le_bytes(buf),
        })
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ByteReadError> {
        let mut buf = [0u8; 4];
        read_exact_checked(&mut self.inner, &mut buf)?;
        Ok(match self.endianness {
            Endianness::Big => u32::from_be_bytes(buf),
            Endianness::Little => u32::from_le_bytes(buf),
        })
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, ByteReadError> {
        let mut buf = [0u8; 8];
        read_exact_checked(&mut self.inner, &mut buf)?;
        Ok(match self.endianness {
            Endianness::Big => u64::from_be_bytes(buf),
            Endianness::Little => u64::from_le_bytes(buf),
        })
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ByteReadError> {
        let mut buf = vec![0u8; n];
        read_exact_checked(&mut self.inner, &mut buf)?;
        Ok(buf)
    }
}

/// Determines the byte order a container is stored in by comparing the
/// on-disk magic against its expected value in both orientations.
///
/// Returns `None` if neither orientation matches.
pub(crate) fn endianness_from_magic(magic_bytes: [u8; 4], expected: u32) -> Option<Endianness> {
    let native = u32::from_be_bytes(magic_bytes);
    if native == expected {
        return Some(Endianness::Big);
    }
    if native.swap_bytes() == expected {
        return Some(Endianness::Little);
    }
    None
}
