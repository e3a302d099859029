//! Sequential reading on top of a positional source.
//!
//! [`SourceCursor`] owns the only read cursor in the crate. It is built
//! over a borrowed [`ReadAt`] and refills a read-ahead window with
//! positional reads, so decoding a header over HTTP costs one or two
//! Range requests instead of one per byte.

use byteorder::{ByteOrder, LittleEndian};
use std::io;

use super::ReadAt;

/// Default read-ahead window size.
pub const DEFAULT_READ_AHEAD: usize = 64 * 1024;

/// Buffered sequential reader with absolute seek.
pub struct SourceCursor<'a, R: ReadAt + ?Sized> {
    source: &'a R,
    /// Buffered bytes starting at `window_start`.
    window: Vec<u8>,
    window_start: u64,
    /// Index of the next unread byte in `window`.
    pos: usize,
    read_ahead: usize,
}

impl<'a, R: ReadAt + ?Sized> SourceCursor<'a, R> {
    /// Create a cursor positioned at offset 0.
    pub fn new(source: &'a R) -> Self {
        Self::with_read_ahead(source, DEFAULT_READ_AHEAD)
    }

    pub fn with_read_ahead(source: &'a R, read_ahead: usize) -> Self {
        Self {
            source,
            window: Vec::new(),
            window_start: 0,
            pos: 0,
            read_ahead: read_ahead.max(1),
        }
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.window_start + self.pos as u64
    }

    /// Move the cursor to an absolute offset.
    ///
    /// Seeking inside the buffered window keeps the buffer.
    pub fn seek(&mut self, offset: u64) {
        let end = self.window_start + self.window.len() as u64;
        if offset >= self.window_start && offset <= end {
            self.pos = (offset - self.window_start) as usize;
        } else {
            self.window.clear();
            self.window_start = offset;
            self.pos = 0;
        }
    }

    /// Refill the window at the current position. Returns the number of
    /// bytes now buffered, `0` at end of source.
    async fn fill(&mut self) -> io::Result<usize> {
        self.window_start += self.pos as u64;
        self.pos = 0;
        self.window.resize(self.read_ahead, 0);
        let n = match self.source.read_at(self.window_start, &mut self.window).await {
            Ok(n) => n,
            Err(e) => {
                self.window.clear();
                return Err(e);
            }
        };
        self.window.truncate(n);
        Ok(n)
    }

    fn buffered(&self) -> &[u8] {
        &self.window[self.pos..]
    }

    /// Fill `buf` completely or fail with `UnexpectedEof`.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.buffered().is_empty() && self.fill().await? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "wanted {} bytes at offset {}, source ended",
                        buf.len(),
                        self.position() - filled as u64
                    ),
                ));
            }
            let n = self.buffered().len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&self.window[self.pos..self.pos + n]);
            self.pos += n;
            filled += n;
        }
        Ok(())
    }

    pub async fn read_u8(&mut self) -> io::Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b).await?;
        Ok(b[0])
    }

    pub async fn read_u32(&mut self) -> io::Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b).await?;
        Ok(LittleEndian::read_u32(&b))
    }

    pub async fn read_i32(&mut self) -> io::Result<i32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b).await?;
        Ok(LittleEndian::read_i32(&b))
    }

    pub async fn read_u64(&mut self) -> io::Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b).await?;
        Ok(LittleEndian::read_u64(&b))
    }

    /// Read the bytes of a null-terminated string. The terminator is
    /// consumed and dropped; end of source also ends the string without
    /// error.
    pub async fn read_cstring_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            if self.buffered().is_empty() && self.fill().await? == 0 {
                break;
            }
            let available = self.buffered();
            match available.iter().position(|&b| b == 0) {
                Some(nul) => {
                    bytes.extend_from_slice(&available[..nul]);
                    self.pos += nul + 1;
                    break;
                }
                None => {
                    let n = available.len();
                    bytes.extend_from_slice(available);
                    self.pos += n;
                }
            }
        }
        Ok(bytes)
    }

    /// [`read_cstring_bytes`](Self::read_cstring_bytes) decoded as text,
    /// with invalid UTF-8 replaced.
    pub async fn read_cstring(&mut self) -> io::Result<String> {
        let bytes = self.read_cstring_bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
