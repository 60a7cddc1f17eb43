//! Read/seek adapter over a borrowed byte buffer.
//!
//! Seeks never fail for being out of range: the cursor is clamped into
//! `[0, size - 1]`, which is what permissive demuxers probing past the end of
//! a truncated buffer expect.

use std::io::{self, Read, Seek, SeekFrom};

use thiserror::Error;

/// Errors raised by [`BoundedMemoryStream::seek_to`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// The seek mode is not one the stream understands.
    #[error("Unknown seek mode: {0:?}")]
    UnsupportedWhence(Whence),
}

/// Seek modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute offset from the start of the buffer.
    Set,
    /// Offset relative to the cursor.
    Current,
    /// Offset relative to the end. Not supported.
    End,
    /// Report the total buffer size without moving the cursor.
    Size,
}

/// A cursor over a caller-owned byte slice.
#[derive(Debug)]
pub struct BoundedMemoryStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BoundedMemoryStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total size of the underlying buffer.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move the cursor and return its new position, or the buffer size for
    /// [`Whence::Size`].
    ///
    /// On an unsupported mode the cursor is left where it was.
    pub fn seek_to(&mut self, offset: i64, whence: Whence) -> Result<u64, StreamError> {
        match whence {
            Whence::Size => return Ok(self.data.len() as u64),
            Whence::Set => self.pos = self.clamp(offset),
            Whence::Current => self.pos = self.clamp((self.pos as i64).saturating_add(offset)),
            Whence::End => {
                log::error!("Unknown seek mode: {:?}", whence);
                return Err(StreamError::UnsupportedWhence(whence));
            }
        }
        Ok(self.pos as u64)
    }

    /// Valid positions are 0 (start of buffer) through `size - 1` (last byte).
    fn clamp(&self, position: i64) -> usize {
        let last = self.data.len().saturating_sub(1) as i64;
        position.clamp(0, last) as usize
    }
}

impl Read for BoundedMemoryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let unread = self.remaining();
        if unread == 0 {
            return Ok(0);
        }

        let count = buf.len().min(unread);
        buf[..count].copy_from_slice(&self.data[self.pos..self.pos + count]);
        self.pos += count;
        Ok(count)
    }
}

impl Seek for BoundedMemoryStream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, whence) = match pos {
            // A position query; the cursor may legitimately sit at the end.
            SeekFrom::Current(0) => return Ok(self.pos as u64),
            SeekFrom::Start(offset) => (i64::try_from(offset).unwrap_or(i64::MAX), Whence::Set),
            SeekFrom::Current(offset) => (offset, Whence::Current),
            SeekFrom::End(offset) => (offset, Whence::End),
        };
        self.seek_to(offset, whence)
            .map_err(|e| io::Error::new(io::ErrorKind::Unsupported, e))
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

    #[test]
    fn test_read_copies_from_cursor() {
        let mut stream = BoundedMemoryStream::new(DATA);
        let mut buf = [0u8; 4];

        assert_eq!(stream.read(&mut buf).unwrap(), 4);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_read_never_exceeds_remaining() {
        let mut stream = BoundedMemoryStream::new(DATA);
        stream.seek_to(7, Whence::Set).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[7, 8, 9]);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_zero_length_read() {
        let mut stream = BoundedMemoryStream::new(DATA);
        assert_eq!(stream.read(&mut []).unwrap(), 0);
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_seek_past_end_clamps_to_last_byte() {
        let mut stream = BoundedMemoryStream::new(DATA);
        assert_eq!(stream.seek_to(100, Whence::Set).unwrap(), 9);
        assert_eq!(stream.position(), 9);
    }

    #[test]
    fn test_seek_negative_clamps_to_zero() {
        let mut stream = BoundedMemoryStream::new(DATA);
        stream.seek_to(5, Whence::Set).unwrap();
        assert_eq!(stream.seek_to(-20, Whence::Current).unwrap(), 0);
        assert_eq!(stream.seek_to(-1, Whence::Set).unwrap(), 0);
    }

    #[test]
    fn test_seek_relative() {
        let mut stream = BoundedMemoryStream::new(DATA);
        stream.seek_to(2, Whence::Set).unwrap();
        assert_eq!(stream.seek_to(3, Whence::Current).unwrap(), 5);
        assert_eq!(stream.seek_to(i64::MAX, Whence::Current).unwrap(), 9);
    }

    #[test]
    fn test_seek_size_reports_total_without_moving() {
        let mut stream = BoundedMemoryStream::new(DATA);
        stream.seek_to(3, Whence::Set).unwrap();
        assert_eq!(stream.seek_to(0, Whence::Size).unwrap(), 10);
        assert_eq!(stream.position(), 3);
    }

    #[test]
    fn test_seek_end_is_rejected_and_cursor_kept() {
        let mut stream = BoundedMemoryStream::new(DATA);
        stream.seek_to(4, Whence::Set).unwrap();
        assert_eq!(
            stream.seek_to(0, Whence::End),
            Err(StreamError::UnsupportedWhence(Whence::End))
        );
        assert_eq!(stream.position(), 4);
        assert!(stream.seek(SeekFrom::End(0)).is_err());
    }

    #[test]
    fn test_empty_buffer_stays_at_zero() {
        let mut stream = BoundedMemoryStream::new(&[]);
        assert_eq!(stream.seek_to(10, Whence::Set).unwrap(), 0);
        assert_eq!(stream.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn test_std_seek_maps_onto_modes() {
        let mut stream = BoundedMemoryStream::new(DATA);
        assert_eq!(stream.seek(SeekFrom::Start(6)).unwrap(), 6);
        assert_eq!(stream.seek(SeekFrom::Current(-2)).unwrap(), 4);
        assert_eq!(stream.seek(SeekFrom::Start(u64::MAX)).unwrap(), 9);
    }

    #[test]
    fn test_position_query_at_end_does_not_move() {
        let mut stream = BoundedMemoryStream::new(DATA);
        let mut buf = Vec::new();
        assert_eq!(stream.read_to_end(&mut buf).unwrap(), 10);

        assert_eq!(stream.stream_position().unwrap(), 10);
        assert_eq!(stream.seek(SeekFrom::Current(0)).unwrap(), 10);
        assert_eq!(stream.position(), 10);
        assert_eq!(stream.read(&mut [0u8; 4]).unwrap(), 0);
    }

    #[test]
    fn test_buffered_position_after_full_read() {
        let mut reader = io::BufReader::new(BoundedMemoryStream::new(DATA));
        let mut head = [0u8; 3];
        reader.read_exact(&mut head).unwrap();
        assert_eq!(reader.stream_position().unwrap(), 3);

        reader.seek(SeekFrom::Start(6)).unwrap();
        let mut tail = [0u8; 4];
        reader.read_exact(&mut tail).unwrap();
        assert_eq!(tail, [6, 7, 8, 9]);
    }
}
