use std::io::{ErrorKind, Read};

use super::{ByteSource, SourceError};

/// Adapts any `std::io::Read` into a `ByteSource`.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use pmsense_core::{ByteSource, ReaderSource, SourceError};
///
/// let mut source = ReaderSource::new(Cursor::new(vec![0x42]));
/// assert_eq!(source.read_byte().unwrap(), 0x42);
/// assert!(matches!(source.read_byte(), Err(SourceError::EndOfStream)));
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_some(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(SourceError::from_io(err)),
            }
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        let mut byte = [0u8; 1];
        match self.read_some(&mut byte)? {
            0 => Err(SourceError::EndOfStream),
            _ => Ok(byte[0]),
        }
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_some(&mut buf[filled..])? {
                0 if filled == 0 => return Err(SourceError::EndOfStream),
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }
}
