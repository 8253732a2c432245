use std::path::PathBuf;
use thiserror::Error;

/// Error returned by the caller's callbacks, passed through untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ExtcapError {
    #[error("no interface specified")]
    NoInterfaceSpecified,
    #[error("no FIFO pipe provided")]
    NoPipeProvided,
    #[error(transparent)]
    Callback(BoxError),
    #[error("unable to open pipe {path}: {source}")]
    OpenPipe {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unsupported config option type {kind} for --{call}")]
    UnsupportedOption { call: String, kind: String },
    #[error("config option --{name} collides with an existing flag")]
    DuplicateFlag { name: String },
    #[error("invalid config option name: {name:?}")]
    InvalidFlagName { name: String },
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("write output error")]
    Io(#[from] std::io::Error),
    #[error("get system time error")]
    SystemTimeError(#[from] std::time::SystemTimeError),
    #[error("unknown linktype: {linktype}")]
    UnknownLinkType { linktype: u32 },
}

impl ExtcapError {
    /// The caller's own error, if this one came out of a callback.
    pub fn callback(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            ExtcapError::Callback(e) => Some(e.as_ref()),
            _ => None,
        }
    }
    pub fn into_callback(self) -> Result<BoxError, ExtcapError> {
        match self {
            ExtcapError::Callback(e) => Ok(e),
            other => Err(other),
        }
    }
}
