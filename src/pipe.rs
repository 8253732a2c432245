use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::ExtcapError;

/// Writable end handed to the capture callback. Dropping it closes the pipe.
pub type Sink = Box<dyn Write + Send>;

/// Opens the destination given by `--fifo`.
pub trait PipeOpener {
    fn open(&self, path: &Path) -> Result<Sink, ExtcapError>;
}

impl<F> PipeOpener for F
where
    F: Fn(&Path) -> Result<Sink, ExtcapError>,
{
    fn open(&self, path: &Path) -> Result<Sink, ExtcapError> {
        self(path)
    }
}

/// Default opener: the path must already exist (Wireshark creates the FIFO)
/// and is opened write-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoOpener;

impl PipeOpener for FifoOpener {
    fn open(&self, path: &Path) -> Result<Sink, ExtcapError> {
        match OpenOptions::new().write(true).open(path) {
            Ok(fs) => Ok(Box::new(fs)),
            Err(e) => Err(ExtcapError::OpenPipe {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}
