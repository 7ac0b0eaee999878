use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ByteSource, ReaderSource, SourceError};

/// Path that selects standard input instead of a file.
pub const STDIN_PATH: &str = "-";

/// A byte source backed by a capture file, a device node or stdin.
///
/// Line settings of serial devices (baud rate, parity) are left to whoever
/// configured the device; the node is read as a plain file.
pub struct DeviceSource {
    path: PathBuf,
    inner: ReaderSource<BufReader<Box<dyn Read + Send>>>,
}

impl DeviceSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let reader: Box<dyn Read + Send> = if path.as_os_str() == STDIN_PATH {
            Box::new(std::io::stdin())
        } else {
            Box::new(File::open(path)?)
        };
        debug!(path = %path.display(), "opened byte source");
        Ok(Self {
            path: path.to_path_buf(),
            inner: ReaderSource::new(BufReader::new(reader)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for DeviceSource {
    fn read_byte(&mut self) -> Result<u8, SourceError> {
        self.inner.read_byte()
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize, SourceError> {
        self.inner.read_frame(buf)
    }
}

impl std::fmt::Debug for DeviceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
