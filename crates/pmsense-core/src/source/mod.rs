//! Byte sources feeding the frame scanner.
//!
//! A source is a blocking, byte-oriented stream. Every error it reports is
//! fatal for the current session: the stream layer never retries a read on a
//! source that has failed once.

mod device;
mod reader;

pub use device::DeviceSource;
pub use reader::ReaderSource;

use thiserror::Error;

pub trait ByteSource {
    /// Read the next byte, blocking until one is available.
    fn read_byte(&mut self) -> Result<u8, SourceError>;

    /// Fill `buf` as far as the stream allows.
    ///
    /// Returns the number of bytes read, which is smaller than `buf.len()`
    /// only when the stream ended part way through. A stream that ends before
    /// the first byte reports `SourceError::EndOfStream`.
    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        (**self).read_byte()
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        (**self).read_frame(buf)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("end of stream")]
    EndOfStream,
    #[error("read timed out")]
    TimedOut,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Map an I/O error to the matching source error kind.
    pub fn from_io(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => SourceError::EndOfStream,
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => SourceError::TimedOut,
            _ => SourceError::Io(err),
        }
    }
}
