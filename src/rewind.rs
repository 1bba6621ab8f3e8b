//! Tee reader that records consumed bytes, so they can be replayed afterwards.

use std::io::{self, Chain, Cursor, Read};

/// A [`Read`] adapter that keeps a copy of every byte read through it.
#[derive(Debug)]
pub(crate) struct TeeReader<R> {
    inner: R,
    buffer: Vec<u8>,
}

impl<R: Read> TeeReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Stops recording and returns a stream that yields the recorded bytes followed by the rest of
    /// the inner reader.
    pub(crate) fn into_replay(self) -> Replay<R> {
        log::debug!("buffered {} bytes for replay", self.buffer.len());
        Replay {
            inner: Cursor::new(self.buffer).chain(self.inner),
        }
    }
}

impl<R: Read> Read for TeeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.buffer.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// A stream equivalent to the original input stream passed to [`load`][crate::load].
///
/// Reading it produces the exact bytes of the original stream, starting at the position the stream
/// was at when it was handed to [`load`][crate::load], regardless of how much of it was consumed
/// while extracting metadata (and regardless of whether that succeeded).
#[derive(Debug)]
pub struct Replay<R> {
    inner: Chain<Cursor<Vec<u8>>, R>,
}

impl<R> Replay<R> {
    /// Returns the number of buffered bytes that have not been read yet.
    pub fn buffered_len(&self) -> usize {
        let (cursor, _) = self.inner.get_ref();
        let pos = usize::try_from(cursor.position()).unwrap_or(usize::MAX);
        cursor.get_ref().len().saturating_sub(pos)
    }

    /// Discards the unread buffered bytes and returns the original reader, positioned wherever
    /// metadata extraction left it.
    pub fn into_inner(self) -> R {
        let (_, inner) = self.inner.into_inner();
        inner
    }
}

impl<R: Read> Read for Replay<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
