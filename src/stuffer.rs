//! A bounded byte buffer with independent read/write cursors.
//!
//! Grounded in the `s2n_stuffer` contract used throughout
//! `original_source/tls/s2n_handshake_io.c` (`s2n_stuffer_copy`,
//! `s2n_stuffer_raw_read`, `s2n_stuffer_reread`, `s2n_stuffer_wipe`). TLS
//! 1.3 code elsewhere gets away with `bytes::{Bytes, BytesMut}` and ad hoc
//! slicing because it never needs to "put back" a partially read handshake
//! header; the 1.0-1.2 reassembly loop here does, so this type is new
//! machinery rather than an adapted file.

use crate::error::{HandshakeError, Result};

#[derive(Debug, Default, Clone)]
pub struct Stuffer {
    data: Vec<u8>,
    read_cursor: usize,
    write_cursor: usize,
}

impl Stuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: Vec::with_capacity(cap),
            read_cursor: 0,
            write_cursor: 0,
        }
    }

    /// Bytes available to be read (write_cursor - read_cursor).
    pub fn data_available(&self) -> usize {
        self.write_cursor - self.read_cursor
    }

    pub fn is_empty(&self) -> bool {
        self.data_available() == 0
    }

    /// Appends bytes, growing the backing buffer as needed.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.data.len() < self.write_cursor + bytes.len() {
            self.data.resize(self.write_cursor + bytes.len(), 0);
        }
        self.data[self.write_cursor..self.write_cursor + bytes.len()].copy_from_slice(bytes);
        self.write_cursor += bytes.len();
    }

    /// Reads exactly `len` bytes, advancing the read cursor.
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        if self.data_available() < len {
            return Err(HandshakeError::bad_message("stuffer underflow"));
        }
        let start = self.read_cursor;
        self.read_cursor += len;
        Ok(&self.data[start..start + len])
    }

    /// Returns a raw slice of `len` unread bytes without copying, advancing
    /// the read cursor. Mirrors `s2n_stuffer_raw_read`.
    pub fn raw_read(&mut self, len: usize) -> Result<&[u8]> {
        self.read_bytes(len)
    }

    /// Copies up to `max_len` bytes from `self` into `dest`, advancing both
    /// cursors by the number of bytes actually copied. Mirrors
    /// `s2n_stuffer_copy`. Returns the number of bytes copied.
    pub fn copy_into(&mut self, dest: &mut Stuffer, max_len: usize) -> usize {
        let n = max_len.min(self.data_available());
        let bytes = self.data[self.read_cursor..self.read_cursor + n].to_vec();
        dest.write_bytes(&bytes);
        self.read_cursor += n;
        n
    }

    /// Rewinds the read cursor back to the start of the buffer so the next
    /// reader sees everything written so far again. Mirrors
    /// `s2n_stuffer_reread`: used when a handshake header was only partially
    /// accumulated and needs to be re-presented whole next time.
    pub fn reread(&mut self) {
        self.read_cursor = 0;
    }

    /// Clears both cursors and the backing storage. Mirrors
    /// `s2n_stuffer_wipe`.
    pub fn wipe(&mut self) {
        self.data.clear();
        self.read_cursor = 0;
        self.write_cursor = 0;
    }

    /// Shrinks/grows the backing allocation. Mirrors `s2n_stuffer_resize`;
    /// used by the negotiation loop to release the handshake scratch buffer
    /// once the handshake is over.
    pub fn resize(&mut self, new_cap: usize) {
        self.data.truncate(new_cap);
        self.data.shrink_to_fit();
        self.read_cursor = self.read_cursor.min(self.data.len());
        self.write_cursor = self.write_cursor.min(self.data.len());
    }

    /// All bytes written so far, irrespective of the read cursor. Used by
    /// the write driver to hash/frame the whole pending message.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.write_cursor]
    }
}
