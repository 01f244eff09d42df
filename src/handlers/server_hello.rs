//! The ServerHello handler, transcribed field-for-field from
//! `s2n_server_hello_recv`/`s2n_server_hello_send` in
//! `original_source/tls/s2n_server_hello.c`. Session id and extension
//! *contents* are read/skipped but not interpreted — extension semantics
//! are out of scope.

use crate::collaborators::{Prf, SecureRandom};
use crate::connection::SignatureDigestAlg;
use crate::error::{HandshakeError, Result};
use crate::handlers::{signature_digest_alg_for, HandshakeCtx};
use crate::state::HandshakeState;

const PROTOCOL_VERSION_LEN: usize = 2;
const RANDOM_LEN: usize = 32;
const MAX_SESSION_ID_LEN: usize = 32;
const CIPHER_SUITE_LEN: usize = 2;
const COMPRESSION_METHOD_NULL: u8 = 0;

pub fn recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let version_bytes = ctx.handshake_io.read_bytes(PROTOCOL_VERSION_LEN)?;
    let numeric_version = version_bytes[0] * 10 + version_bytes[1];

    if numeric_version > *ctx.actual_protocol_version {
        return Err(HandshakeError::UnsupportedVersion);
    }
    *ctx.server_protocol_version = numeric_version;
    *ctx.actual_protocol_version = numeric_version;
    *ctx.actual_protocol_version_established = true;

    if *ctx.actual_protocol_version < ctx.min_protocol_version || *ctx.actual_protocol_version > ctx.max_protocol_version
    {
        return Err(HandshakeError::UnsupportedVersion);
    }

    ctx.pending.signature_digest_alg = Some(signature_digest_alg_for(*ctx.actual_protocol_version));

    let random = ctx.handshake_io.read_bytes(RANDOM_LEN)?;
    ctx.pending.server_random.copy_from_slice(random);

    let session_id_len = ctx.handshake_io.read_bytes(1)?[0] as usize;
    if session_id_len > MAX_SESSION_ID_LEN {
        return Err(HandshakeError::bad_message("session id too long"));
    }
    let _session_id = ctx.handshake_io.read_bytes(session_id_len)?;

    let cipher_suite_wire = ctx.handshake_io.read_bytes(CIPHER_SUITE_LEN)?;
    let cipher_suite = u16::from_be_bytes([cipher_suite_wire[0], cipher_suite_wire[1]]);
    if !ctx.offered_cipher_suites.contains(&cipher_suite) {
        return Err(HandshakeError::CipherMismatch);
    }
    ctx.pending.cipher_suite = Some(cipher_suite);

    let compression_method = ctx.handshake_io.read_bytes(1)?[0];
    if compression_method != COMPRESSION_METHOD_NULL {
        return Err(HandshakeError::bad_message("non-null compression method"));
    }

    if ctx.handshake_io.data_available() >= 2 {
        let len_bytes = ctx.handshake_io.read_bytes(2)?;
        let extensions_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if extensions_len > ctx.handshake_io.data_available() {
            return Err(HandshakeError::bad_message("extensions overflow"));
        }
        // Extension contents are a collaborator concern; we only bound-check
        // and skip past them here.
        let _ = ctx.handshake_io.read_bytes(extensions_len)?;
    }

    *ctx.next_state = HandshakeState::ServerCert;
    Ok(())
}

pub fn send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let gmt_unix_time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);

    let mut server_random = [0u8; RANDOM_LEN];
    server_random[..4].copy_from_slice(&gmt_unix_time.to_be_bytes());
    ctx.random.fill(&mut server_random[4..]);
    ctx.pending.server_random = server_random;

    if *ctx.server_protocol_version == 0 {
        *ctx.server_protocol_version = ctx.max_protocol_version;
    }

    if *ctx.client_protocol_version < *ctx.server_protocol_version {
        *ctx.actual_protocol_version = *ctx.client_protocol_version;
    } else {
        *ctx.actual_protocol_version = *ctx.server_protocol_version;
    }

    ctx.pending.signature_digest_alg = Some(signature_digest_alg_for(*ctx.actual_protocol_version));

    let protocol_version = [
        *ctx.actual_protocol_version / 10,
        *ctx.actual_protocol_version % 10,
    ];
    ctx.handshake_io.write_bytes(&protocol_version);
    ctx.handshake_io.write_bytes(&ctx.pending.server_random);
    ctx.handshake_io.write_bytes(&[0]); // session_id_len = 0, no session resumption

    let cipher_suite = ctx
        .pending
        .cipher_suite
        .ok_or_else(|| HandshakeError::bad_message("no cipher suite selected before ServerHello"))?;
    ctx.handshake_io.write_bytes(&cipher_suite.to_be_bytes());
    ctx.handshake_io.write_bytes(&[COMPRESSION_METHOD_NULL]);
    // No extensions: extension content is a collaborator concern.

    *ctx.actual_protocol_version_established = true;
    *ctx.next_state = HandshakeState::ServerCert;
    Ok(())
}
