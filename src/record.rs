//! The TLS record layer collaborator.
//!
//! The record layer is an external collaborator, specified only by the
//! interface the core consumes: `read_full_record`, `record_write`,
//! `record_max_write_payload_size`, `flush`. Grounded in `tls/record.rs`
//! (`Record::read`/`serialize`, `ContentType`), with the I/O model changed
//! from an `async fn` to synchronous, explicit-non-blocking calls returning
//! `std::io::ErrorKind::WouldBlock` — an explicit `blocked_on_{read,write}`
//! contract (resumable I/O without coroutines), not a future-based one.
//! Real encryption is out of scope; `PlaintextRecordLayer` is the
//! reference/test implementation used to drive the driver end-to-end.

use std::io::{self, Read, Write};

use crate::error::{HandshakeError, Result};

pub const RECORD_HEADER_LEN: usize = 5;
/// 2^14 + 256, the overflow ceiling enforced in `Record::read`.
pub const MAX_RECORD_PAYLOAD: usize = (1 << 14) + 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    ChangeCipherSpec,
    Alert,
    Handshake,
    ApplicationData,
    Unknown(u8),
}

impl ContentType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            20 => ContentType::ChangeCipherSpec,
            21 => ContentType::Alert,
            22 => ContentType::Handshake,
            23 => ContentType::ApplicationData,
            other => ContentType::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ContentType::ChangeCipherSpec => 20,
            ContentType::Alert => 21,
            ContentType::Handshake => 22,
            ContentType::ApplicationData => 23,
            ContentType::Unknown(v) => v,
        }
    }
}

/// A single TLS record: 1-byte content type, 2-byte legacy version, 2-byte
/// length, and the (plaintext, in this crate) payload.
#[derive(Debug, Clone)]
pub struct Record {
    pub typ: ContentType,
    pub legacy_version: u16,
    pub payload: Vec<u8>,
    /// Set when the record layer detected an SSLv2-compat ClientHello
    /// framing instead of a standard TLS record header. In that case
    /// `payload` is the SSLv2 message body and the three raw header bytes
    /// requiring transcript absorption are in `sslv2_header`.
    pub is_sslv2: bool,
    /// The real `[msg_type, version_major, version_minor]` bytes read off
    /// the wire when `is_sslv2` is set. `None` whenever `is_sslv2` is false —
    /// ordinary records have no such prefix to absorb.
    pub sslv2_header: Option<[u8; 3]>,
}

impl Record {
    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.push(self.typ.to_u8());
        out.extend_from_slice(&self.legacy_version.to_be_bytes());
        assert!(self.payload.len() <= u16::MAX as usize);
        out.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        out.extend_from_slice(&self.payload);
    }
}

/// The record-layer collaborator contract.
pub trait RecordLayer {
    /// Pulls one full record from the transport. Returns the content type
    /// and whether the record layer detected SSLv2-compat framing.
    fn read_full_record(&mut self) -> Result<Record>;

    fn record_write(&mut self, typ: ContentType, payload: &[u8]) -> Result<()>;

    fn record_max_write_payload_size(&self) -> usize;

    /// Flushes previously queued writes to the transport. `Ok(true)` means
    /// fully flushed; `Ok(false)` means the caller would block and must
    /// retry later — the driver treats this as the
    /// `blocked_on_write` signal.
    fn flush(&mut self) -> Result<bool>;
}

/// Reference record layer: frames/parses records over any
/// `Read + Write` transport, honoring `WouldBlock`. No encryption — this
/// crate's scope stops at the record boundary.
pub struct PlaintextRecordLayer<T: Read + Write> {
    transport: T,
    out_pending: Vec<u8>,
    max_fragment: usize,
}

impl<T: Read + Write> PlaintextRecordLayer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            out_pending: Vec::new(),
            max_fragment: 1 << 14,
        }
    }

    fn read_exact_nonblocking(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.transport.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(HandshakeError::TransportClosed)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// An SSLv2-compat ClientHello record. The top bit of the first header
    /// byte stands in for a content-type byte in ordinary framing, so `header`
    /// is the same 5 bytes a normal record header occupies, reinterpreted as
    /// `[len_hi | 0x80, len_lo, msg_type, version_major, version_minor]`. The
    /// trailing 3 bytes are real wire bytes, not anything derived from the
    /// body length, and are what `sslv2_header` carries forward for
    /// transcript absorption.
    fn read_sslv2_record(&mut self, header: [u8; RECORD_HEADER_LEN]) -> Result<Record> {
        let length = (((header[0] & 0x7f) as usize) << 8) | header[1] as usize;
        if length < 3 {
            return Err(HandshakeError::bad_message("sslv2 record shorter than its own header"));
        }
        if header[2] != crate::state::TLS_CLIENT_HELLO {
            return Err(HandshakeError::bad_message("sslv2-compat framing only carries a client hello"));
        }

        let body_len = length - 3;
        if body_len > MAX_RECORD_PAYLOAD {
            return Err(HandshakeError::bad_message("record_overflow"));
        }

        let mut payload = vec![0u8; body_len];
        self.read_exact_nonblocking(&mut payload)?;

        Ok(Record {
            typ: ContentType::Handshake,
            legacy_version: 0x0002,
            payload,
            is_sslv2: true,
            sslv2_header: Some([header[2], header[3], header[4]]),
        })
    }
}

impl<T: Read + Write> RecordLayer for PlaintextRecordLayer<T> {
    fn read_full_record(&mut self) -> Result<Record> {
        let mut header = [0u8; RECORD_HEADER_LEN];
        self.read_exact_nonblocking(&mut header)?;

        if header[0] & 0x80 != 0 {
            return self.read_sslv2_record(header);
        }

        let typ = ContentType::from_u8(header[0]);
        let legacy_version = u16::from_be_bytes([header[1], header[2]]);
        let length = u16::from_be_bytes([header[3], header[4]]) as usize;

        if length > MAX_RECORD_PAYLOAD {
            return Err(HandshakeError::bad_message("record_overflow"));
        }

        let mut payload = vec![0u8; length];
        self.read_exact_nonblocking(&mut payload)?;

        Ok(Record {
            typ,
            legacy_version,
            payload,
            is_sslv2: false,
            sslv2_header: None,
        })
    }

    fn record_write(&mut self, typ: ContentType, payload: &[u8]) -> Result<()> {
        let record = Record {
            typ,
            legacy_version: 0x0303,
            payload: payload.to_vec(),
            is_sslv2: false,
            sslv2_header: None,
        };
        record.serialize(&mut self.out_pending);
        Ok(())
    }

    fn record_max_write_payload_size(&self) -> usize {
        self.max_fragment
    }

    fn flush(&mut self) -> Result<bool> {
        if self.out_pending.is_empty() {
            return Ok(true);
        }
        match self.transport.write_all(&self.out_pending) {
            Ok(()) => {
                self.out_pending.clear();
                self.transport.flush()?;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_roundtrips() {
        for v in [20u8, 21, 22, 23, 99] {
            assert_eq!(ContentType::from_u8(v).to_u8(), v);
        }
    }

    #[test]
    fn record_serializes_header_then_payload() {
        let r = Record {
            typ: ContentType::Handshake,
            legacy_version: 0x0301,
            payload: vec![1, 2, 3],
            is_sslv2: false,
            sslv2_header: None,
        };
        let mut out = vec![];
        r.serialize(&mut out);
        assert_eq!(out, vec![22, 0x03, 0x01, 0x00, 0x03, 1, 2, 3]);
    }

    #[test]
    fn read_full_record_detects_sslv2_framing_with_real_header_bytes() {
        let body = vec![9u8, 8, 7, 6];
        let length = 3 + body.len();
        let mut wire = vec![0x80 | ((length >> 8) as u8), (length & 0xff) as u8, 1, 3, 1];
        wire.extend_from_slice(&body);

        let mut layer = PlaintextRecordLayer::new(io::Cursor::new(wire));
        let record = layer.read_full_record().unwrap();

        assert!(record.is_sslv2);
        assert_eq!(record.sslv2_header, Some([1, 3, 1]));
        assert_eq!(record.payload, body);
    }

    #[test]
    fn read_full_record_rejects_sslv2_framing_for_a_non_client_hello_type() {
        let mut wire = vec![0x80, 3, 2, 3, 1]; // msg_type 2, length 3 (header only)
        wire.extend_from_slice(&[]);
        let mut layer = PlaintextRecordLayer::new(io::Cursor::new(wire));
        let err = layer.read_full_record().unwrap_err();
        assert!(matches!(err, HandshakeError::BadMessage(_)));
    }
}
