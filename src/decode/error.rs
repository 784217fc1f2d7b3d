//! Error types for opening and decoding video.

use std::path::PathBuf;

/// Failure reported by a decode or conversion capability
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Why a video could not be opened.
///
/// Raised only while opening; every resource allocated up to the failure
/// has been released by the time the caller sees it.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("cannot open video stream {path}: {source}")]
    ContainerOpen {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("cannot find video stream")]
    NoVideoStream,
    #[error("cannot open codec: {0}")]
    CodecOpen(#[source] BackendError),
    #[error("cannot preallocate frames: {0}")]
    Allocation(String),
    #[error("scale context init failed: {0}")]
    ConversionInit(#[source] BackendError),
}

/// A packet the decoder rejected. Recovered locally by dropping the packet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("incomplete video packet: {0}")]
pub struct DecodeError(pub String);

impl From<BackendError> for DecodeError {
    fn from(err: BackendError) -> Self {
        DecodeError(err.0)
    }
}
