//! Shared scripted `RecordLayer` test double and wire-format helpers for the
//! boundary-scenario and end-to-end integration tests.

use std::collections::VecDeque;
use std::io;

use tls_handshake_core::{ContentType, HandshakeError, Record, RecordLayer, Result, SecureRandom};

/// Initializes the test logger, following the same `try_init` idiom used
/// throughout the pack's own integration tests. Safe to call once per test;
/// a second call in the same process is a harmless no-op.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// A `SecureRandom` that always fills with the same byte. Deterministic
/// stand-in for `OsRandom` in tests that exercise a `send` path.
pub struct FixedRandom(pub u8);

impl SecureRandom for FixedRandom {
    fn fill(&mut self, buf: &mut [u8]) {
        buf.fill(self.0);
    }
}

/// A `RecordLayer` driven entirely by a preloaded queue of inbound records,
/// with outbound writes captured into a queue of their own — standing in
/// for a real transport so the driver's reassembly and framing logic can be
/// exercised byte-for-byte deterministically.
pub struct ScriptedRecordLayer {
    pub inbound: VecDeque<Record>,
    pub outbound: VecDeque<Record>,
    pub max_fragment: usize,
}

impl ScriptedRecordLayer {
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            outbound: VecDeque::new(),
            max_fragment: 1 << 14,
        }
    }

    pub fn push(&mut self, typ: ContentType, payload: Vec<u8>) {
        self.inbound.push_back(Record {
            typ,
            legacy_version: 0x0303,
            payload,
            is_sslv2: false,
            sslv2_header: None,
        });
    }

    /// Scripts an SSLv2-compat ClientHello record with an explicit header.
    /// `header` is the real `[msg_type, version_major, version_minor]` the
    /// record layer would have read off the wire — callers pick it
    /// independently of `payload.len()` so tests can tell a real header from
    /// one a buggy driver might recompute from the body length instead.
    pub fn push_sslv2(&mut self, header: [u8; 3], payload: Vec<u8>) {
        self.inbound.push_back(Record {
            typ: ContentType::Handshake,
            legacy_version: 0x0002,
            payload,
            is_sslv2: true,
            sslv2_header: Some(header),
        });
    }

    pub fn drain_outbound(&mut self) -> Vec<Record> {
        self.outbound.drain(..).collect()
    }
}

impl RecordLayer for ScriptedRecordLayer {
    fn read_full_record(&mut self) -> Result<Record> {
        self.inbound
            .pop_front()
            .ok_or_else(|| HandshakeError::Io(io::Error::new(io::ErrorKind::WouldBlock, "no scripted record")))
    }

    fn record_write(&mut self, typ: ContentType, payload: &[u8]) -> Result<()> {
        self.outbound.push_back(Record {
            typ,
            legacy_version: 0x0303,
            payload: payload.to_vec(),
            is_sslv2: false,
            sslv2_header: None,
        });
        Ok(())
    }

    fn record_max_write_payload_size(&self) -> usize {
        self.max_fragment
    }

    fn flush(&mut self) -> Result<bool> {
        Ok(true)
    }
}

/// Frames a handshake message: 1-byte type + 3-byte big-endian length + body.
pub fn framed_message(msg_type: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    tls_handshake_core::handshake_message::write_header(msg_type, body.len() as u32, &mut out);
    out.extend_from_slice(body);
    out
}

pub fn server_hello_body(cipher_suite: u16, server_random: [u8; 32]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[3, 3]); // TLS 1.2
    body.extend_from_slice(&server_random);
    body.push(0); // session_id_len = 0
    body.extend_from_slice(&cipher_suite.to_be_bytes());
    body.push(0); // compression method: null
    body
}

pub fn certificate_body(chain: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut len_buf = Vec::with_capacity(3);
    write_u24(&mut len_buf, chain.len());
    body.extend_from_slice(&len_buf);
    body.extend_from_slice(chain);
    body
}

pub fn write_u24(out: &mut Vec<u8>, len: usize) {
    let bytes = (len as u32).to_be_bytes();
    out.extend_from_slice(&bytes[1..]);
}

pub fn client_hello_body(cipher_suites: &[u16], client_random: [u8; 32]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&[3, 3]);
    body.extend_from_slice(&client_random);
    body.push(0); // session_id_len
    body.extend_from_slice(&((cipher_suites.len() * 2) as u16).to_be_bytes());
    for suite in cipher_suites {
        body.extend_from_slice(&suite.to_be_bytes());
    }
    body.push(1); // one compression method
    body.push(0); // null
    body
}

/// An SSLv2-compat ClientHello body, version excluded — that lives in the
/// record's `sslv2_header` on the real wire, not the body. Cipher-spec list
/// (3 bytes per entry, wire code in the last 2), session id, challenge.
pub fn sslv2_client_hello_body(cipher_suites: &[u16], challenge: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    let cipher_specs_len = (cipher_suites.len() * 3) as u16;
    body.extend_from_slice(&cipher_specs_len.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes()); // session_id_len
    body.extend_from_slice(&(challenge.len() as u16).to_be_bytes());
    for suite in cipher_suites {
        body.push(0);
        body.extend_from_slice(&suite.to_be_bytes());
    }
    body.extend_from_slice(challenge);
    body
}
