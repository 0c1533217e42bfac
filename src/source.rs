//! Forward-only byte sources for the chunk walker.
//!
//! The decoder only ever reads forward. Skipping is expressed as a relative
//! advance so that non-seekable inputs (pipes, sockets) work the same as
//! files and in-memory buffers.

use std::io::{self, Read};

use crate::error::{FormatError, Result};

/// Block size used when draining or growing buffers from a `Read` source.
const READ_BLOCK: usize = 64 * 1024;

/// A sequential source of bytes.
///
/// Implementors provide the two "best effort" primitives; the strict
/// variants fail with [`FormatError::TruncatedStream`] on a short read.
pub trait ByteSource {
    /// Fill as much of `buf` as the source allows. Returns the number of
    /// bytes written; fewer than `buf.len()` means the source is exhausted.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Advance up to `n` bytes. Returns how far the source actually moved.
    fn skip_up_to(&mut self, n: u64) -> Result<u64>;

    /// Fill all of `buf` or fail.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let got = self.read_up_to(buf)?;
        if got < buf.len() {
            return Err(FormatError::truncated(buf.len() as u64, got as u64));
        }
        Ok(())
    }

    /// Advance exactly `n` bytes or fail.
    fn skip(&mut self, n: u64) -> Result<()> {
        let moved = self.skip_up_to(n)?;
        if moved < n {
            return Err(FormatError::truncated(n, moved));
        }
        Ok(())
    }

    /// Read exactly `n` bytes into a fresh vector.
    ///
    /// Grows in blocks, so a corrupt length field costs at most one block of
    /// memory beyond what the source really holds.
    fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(READ_BLOCK));
        while out.len() < n {
            let start = out.len();
            let want = (n - start).min(READ_BLOCK);
            out.resize(start + want, 0);
            let got = self.read_up_to(&mut out[start..])?;
            if got < want {
                return Err(FormatError::truncated(n as u64, (start + got) as u64));
            }
        }
        Ok(out)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_up_to(buf)
    }

    fn skip_up_to(&mut self, n: u64) -> Result<u64> {
        (**self).skip_up_to(n)
    }

    fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        (**self).read_vec(n)
    }
}

/// An in-memory byte source.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        SliceSource { data, pos: 0 }
    }

    /// Current read offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ByteSource for SliceSource<'_> {
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn skip_up_to(&mut self, n: u64) -> Result<u64> {
        let moved = n.min(self.remaining() as u64);
        self.pos += moved as usize;
        Ok(moved)
    }

    fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        let available = self.remaining();
        if n > available {
            return Err(FormatError::truncated(n as u64, available as u64));
        }
        let out = self.data[self.pos..self.pos + n].to_vec();
        self.pos += n;
        Ok(out)
    }
}

/// A byte source over any [`std::io::Read`].
///
/// Early end-of-file is reported as a short count rather than an I/O error,
/// so the strict methods surface it as `TruncatedStream`.
#[derive(Debug)]
pub struct ReaderSource<R: Read> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        ReaderSource { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn skip_up_to(&mut self, n: u64) -> Result<u64> {
        let moved = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        Ok(moved)
    }
}
