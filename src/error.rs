use std::io;

use thiserror::Error;

/// Result type alias for WAVE codec operations.
pub type Result<T> = std::result::Result<T, FormatError>;

/// Errors that can occur while decoding or encoding a RIFF/WAVE stream.
///
/// All of these are terminal: a malformed file is never partially recovered.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The stream does not start with the `RIFF` magic.
    #[error("not a RIFF file")]
    NotRiff,

    /// The RIFF form type is not `WAVE`.
    #[error("not a WAVE file")]
    NotWave,

    /// The `fmt ` chunk declares a format tag other than PCM (1) or IEEE float (3).
    #[error("unsupported WAVE format tag: {0:#06x}")]
    UnsupportedFormat(u16),

    /// The bit depth is not supported for the given format tag.
    #[error("unsupported bit depth: {bits_per_sample} bits for format tag {format_tag}")]
    UnsupportedBitDepth { format_tag: u16, bits_per_sample: u16 },

    /// The stream ended before a required chunk was found, or `data` came before `fmt `.
    #[error("missing required '{0}' chunk")]
    MissingChunk(&'static str),

    /// A read needed more bytes than the stream had left.
    #[error("truncated stream: needed {needed} bytes, only {available} available")]
    TruncatedStream { needed: u64, available: u64 },

    /// A `fmt ` chunk with degenerate or too few fields.
    #[error("invalid fmt chunk: {0}")]
    InvalidFormat(String),

    /// A sample buffer was constructed from inconsistent parameters.
    #[error("invalid sample buffer: {0}")]
    InvalidConstruction(String),

    /// A wrapped I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    pub(crate) fn truncated(needed: u64, available: u64) -> Self {
        FormatError::TruncatedStream { needed, available }
    }

    pub(crate) fn invalid_construction<S: Into<String>>(msg: S) -> Self {
        FormatError::InvalidConstruction(msg.into())
    }

    pub(crate) fn invalid_format<S: Into<String>>(msg: S) -> Self {
        FormatError::InvalidFormat(msg.into())
    }
}
