use core::fmt;
use std::io;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned when metadata could not be extracted from a JPEG stream.
///
/// Use [`Error::kind`] to find out what went wrong.
pub struct Error {
    repr: Repr,
}

pub(crate) enum Repr {
    Io(io::Error),
    UnexpectedEof,
    NoMetadata,
    InconsistentChunkCount { expected: usize, found: u8 },
    InvalidChunkNumber { number: u8, total: usize },
    Other(String),
}

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The underlying reader failed.
    Io,
    /// The stream ended before an SOS or EOI marker was reached.
    UnexpectedEof,
    /// An SOS or EOI marker was reached without a preceding SOF segment.
    NoMetadata,
    /// ICC profile chunks disagree on the total number of chunks.
    InconsistentChunkCount,
    /// An ICC profile chunk number is 0 or exceeds the chunk total.
    InvalidChunkNumber,
    /// The JPEG data is structurally invalid.
    Malformed,
}

impl From<String> for Repr {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}
impl<'a> From<&'a str> for Repr {
    fn from(value: &'a str) -> Self {
        Self::Other(value.into())
    }
}
impl From<io::Error> for Repr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl Error {
    pub(crate) fn from(e: impl Into<Repr>) -> Self {
        Self { repr: e.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.repr {
            Repr::Io(_) => ErrorKind::Io,
            Repr::UnexpectedEof => ErrorKind::UnexpectedEof,
            Repr::NoMetadata => ErrorKind::NoMetadata,
            Repr::InconsistentChunkCount { .. } => ErrorKind::InconsistentChunkCount,
            Repr::InvalidChunkNumber { .. } => ErrorKind::InvalidChunkNumber,
            Repr::Other(_) => ErrorKind::Malformed,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::from(Repr::Io(value))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Io(e) => e.fmt(f),
            _ => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Io(e) => write!(f, "I/O error while reading JPEG stream: {e}"),
            Repr::UnexpectedEof => f.write_str("unexpected end of stream"),
            Repr::NoMetadata => f.write_str("no metadata found"),
            Repr::InconsistentChunkCount { expected, found } => write!(
                f,
                "inconsistent ICC profile chunk count (expected {expected}, found {found})"
            ),
            Repr::InvalidChunkNumber { number, total } => {
                write!(f, "invalid ICC profile chunk number {number} (total {total})")
            }
            Repr::Other(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.repr {
            Repr::Io(e) => Some(e),
            _ => None,
        }
    }
}
