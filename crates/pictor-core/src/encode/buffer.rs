//! Ownership of encoded thumbnail bytes.

/// Holds at most one encoded packet until it is released or dropped.
///
/// The backing allocation may be larger than the packet; [`OutputBuffer::len`]
/// is the packet length and [`OutputBuffer::allocated_len`] the allocation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    data: Option<Box<[u8]>>,
    len: usize,
}

impl OutputBuffer {
    /// Take ownership of `data`, of which the first `len` bytes are the packet.
    pub(crate) fn from_packet(data: Vec<u8>, len: usize) -> Self {
        let len = len.min(data.len());
        Self {
            data: Some(data.into_boxed_slice()),
            len,
        }
    }

    /// The packet bytes; empty once released.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            Some(data) => &data[..self.len],
            None => &[],
        }
    }

    /// Packet length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing allocation, 0 once released.
    pub fn allocated_len(&self) -> usize {
        self.data.as_ref().map_or(0, |data| data.len())
    }

    /// Free the allocation. Calling this again is a no-op.
    pub fn release(&mut self) {
        self.data = None;
        self.len = 0;
    }
}
