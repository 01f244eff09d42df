//! The ClientHello handler, including the SSLv2-compat framing. Cipher
//! suite *selection* (intersecting the peer's offer against
//! `ctx.offered_cipher_suites`) is real; certificate/extension content is
//! out of scope and only bound-checked and skipped.

use crate::collaborators::{Prf, SecureRandom};
use crate::error::{HandshakeError, Result};
use crate::handlers::HandshakeCtx;
use crate::state::HandshakeState;

const PROTOCOL_VERSION_LEN: usize = 2;
const RANDOM_LEN: usize = 32;
const MAX_SESSION_ID_LEN: usize = 32;
const COMPRESSION_METHOD_NULL: u8 = 0;

pub fn send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let gmt_unix_time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);

    let mut client_random = [0u8; RANDOM_LEN];
    client_random[..4].copy_from_slice(&gmt_unix_time.to_be_bytes());
    ctx.random.fill(&mut client_random[4..]);
    ctx.pending.client_random = client_random;

    *ctx.client_protocol_version = ctx.max_protocol_version;

    let protocol_version = [*ctx.client_protocol_version / 10, *ctx.client_protocol_version % 10];
    ctx.handshake_io.write_bytes(&protocol_version);
    ctx.handshake_io.write_bytes(&client_random);
    ctx.handshake_io.write_bytes(&[0]); // session_id_len = 0

    let suites_len = (ctx.offered_cipher_suites.len() * 2) as u16;
    ctx.handshake_io.write_bytes(&suites_len.to_be_bytes());
    for suite in ctx.offered_cipher_suites {
        ctx.handshake_io.write_bytes(&suite.to_be_bytes());
    }

    ctx.handshake_io.write_bytes(&[1, COMPRESSION_METHOD_NULL]); // one compression method: null
    // No extensions: extension content is a collaborator concern.

    *ctx.next_state = HandshakeState::ServerHello;
    Ok(())
}

pub fn recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let version_bytes = ctx.handshake_io.read_bytes(PROTOCOL_VERSION_LEN)?;
    *ctx.client_protocol_version = version_bytes[0] * 10 + version_bytes[1];

    let random = ctx.handshake_io.read_bytes(RANDOM_LEN)?;
    ctx.pending.client_random.copy_from_slice(random);

    let session_id_len = ctx.handshake_io.read_bytes(1)?[0] as usize;
    if session_id_len > MAX_SESSION_ID_LEN {
        return Err(HandshakeError::bad_message("session id too long"));
    }
    let _session_id = ctx.handshake_io.read_bytes(session_id_len)?;

    let suites_len_bytes = ctx.handshake_io.read_bytes(2)?;
    let suites_len = u16::from_be_bytes([suites_len_bytes[0], suites_len_bytes[1]]) as usize;
    if suites_len == 0 || suites_len % 2 != 0 {
        return Err(HandshakeError::bad_message("odd cipher suite list length"));
    }
    let suites_raw = ctx.handshake_io.read_bytes(suites_len)?.to_vec();
    let offered_by_peer: Vec<u16> = suites_raw
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();

    let compression_len = ctx.handshake_io.read_bytes(1)?[0] as usize;
    let compression_methods = ctx.handshake_io.read_bytes(compression_len)?;
    if !compression_methods.contains(&COMPRESSION_METHOD_NULL) {
        return Err(HandshakeError::bad_message("no null compression method offered"));
    }

    if ctx.handshake_io.data_available() >= 2 {
        let len_bytes = ctx.handshake_io.read_bytes(2)?;
        let extensions_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if extensions_len > ctx.handshake_io.data_available() {
            return Err(HandshakeError::bad_message("extensions overflow"));
        }
        let _ = ctx.handshake_io.read_bytes(extensions_len)?;
    }

    select_cipher_suite(ctx, &offered_by_peer)?;

    *ctx.next_state = HandshakeState::ServerHello;
    Ok(())
}

/// The legacy SSLv2-compat ClientHello body: recognized only in
/// `CLIENT_HELLO`, a different wire shape from the TLS record framing.
/// The driver is responsible for the asymmetric transcript absorption (3
/// synthetic header bytes plus the full body); this handler only parses.
pub fn sslv2_recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let version_bytes = ctx.handshake_io.read_bytes(PROTOCOL_VERSION_LEN)?;
    *ctx.client_protocol_version = version_bytes[0] * 10 + version_bytes[1];

    let cipher_spec_len = read_u16(ctx)? as usize;
    let session_id_len = read_u16(ctx)? as usize;
    let challenge_len = read_u16(ctx)? as usize;

    if cipher_spec_len == 0 || cipher_spec_len % 3 != 0 {
        return Err(HandshakeError::bad_message("malformed sslv2 cipher spec list"));
    }
    if session_id_len > MAX_SESSION_ID_LEN {
        return Err(HandshakeError::bad_message("session id too long"));
    }
    if challenge_len == 0 || challenge_len > RANDOM_LEN {
        return Err(HandshakeError::bad_message("malformed sslv2 challenge length"));
    }

    let cipher_specs = ctx.handshake_io.read_bytes(cipher_spec_len)?.to_vec();
    let offered_by_peer: Vec<u16> = cipher_specs
        .chunks_exact(3)
        .map(|c| u16::from_be_bytes([c[1], c[2]]))
        .collect();

    let _session_id = ctx.handshake_io.read_bytes(session_id_len)?;

    let challenge = ctx.handshake_io.read_bytes(challenge_len)?;
    let mut client_random = [0u8; RANDOM_LEN];
    client_random[RANDOM_LEN - challenge.len()..].copy_from_slice(challenge);
    ctx.pending.client_random = client_random;

    select_cipher_suite(ctx, &offered_by_peer)?;

    *ctx.next_state = HandshakeState::ServerHello;
    Ok(())
}

fn read_u16<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<u16> {
    let bytes = ctx.handshake_io.read_bytes(2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn select_cipher_suite<R: SecureRandom, P: Prf>(
    ctx: &mut HandshakeCtx<R, P>,
    offered_by_peer: &[u16],
) -> Result<()> {
    let selected = ctx
        .offered_cipher_suites
        .iter()
        .find(|ours| offered_by_peer.contains(ours))
        .copied()
        .ok_or(HandshakeError::CipherMismatch)?;
    ctx.pending.cipher_suite = Some(selected);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NullPrf;
    use crate::connection::{Pending, SSLV3, TLS_1_2};
    use crate::state::Mode;
    use crate::stuffer::Stuffer;

    struct FixedRandom;
    impl SecureRandom for FixedRandom {
        fn fill(&mut self, buf: &mut [u8]) {
            buf.fill(0x11);
        }
    }

    fn make_ctx<'a>(
        io: &'a mut Stuffer,
        client_v: &'a mut u8,
        server_v: &'a mut u8,
        actual_v: &'a mut u8,
        established: &'a mut bool,
        pending: &'a mut Pending,
        offered: &'a [u16],
        next: &'a mut HandshakeState,
        random: &'a mut FixedRandom,
        prf: &'a NullPrf,
    ) -> HandshakeCtx<'a, FixedRandom, NullPrf> {
        HandshakeCtx {
            handshake_io: io,
            mode: Mode::Client,
            client_protocol_version: client_v,
            server_protocol_version: server_v,
            actual_protocol_version: actual_v,
            actual_protocol_version_established: established,
            pending,
            offered_cipher_suites: offered,
            next_state: next,
            random,
            prf,
            transcript_hash_for_finished: &[],
            min_protocol_version: SSLV3,
            max_protocol_version: TLS_1_2,
        }
    }

    #[test]
    fn send_then_recv_agree_on_cipher_suite() {
        let offered = vec![0xc013u16, 0xc014u16];

        let mut send_io = Stuffer::new();
        let mut cv = 0u8;
        let mut sv = 0u8;
        let mut av = 0u8;
        let mut est = false;
        let mut pending = Pending::default();
        let mut next = HandshakeState::ClientHello;
        let mut random = FixedRandom;
        let prf = NullPrf;
        {
            let mut ctx = make_ctx(
                &mut send_io, &mut cv, &mut sv, &mut av, &mut est, &mut pending, &offered, &mut next,
                &mut random, &prf,
            );
            send(&mut ctx).unwrap();
        }
        assert_eq!(next, HandshakeState::ServerHello);

        let mut recv_io = Stuffer::new();
        recv_io.write_bytes(send_io.as_slice());

        let server_offered = vec![0xc014u16];
        let mut cv2 = 0u8;
        let mut sv2 = 0u8;
        let mut av2 = 0u8;
        let mut est2 = false;
        let mut pending2 = Pending::default();
        let mut next2 = HandshakeState::ClientHello;
        let mut random2 = FixedRandom;
        let mut ctx2 = make_ctx(
            &mut recv_io, &mut cv2, &mut sv2, &mut av2, &mut est2, &mut pending2, &server_offered,
            &mut next2, &mut random2, &prf,
        );
        recv(&mut ctx2).unwrap();

        assert_eq!(pending2.cipher_suite, Some(0xc014));
        assert_eq!(pending2.client_random, pending.client_random);
        assert_eq!(next2, HandshakeState::ServerHello);
    }

    #[test]
    fn recv_rejects_when_no_mutual_cipher_suite() {
        let mut io = Stuffer::new();
        io.write_bytes(&[3, 3]);
        io.write_bytes(&[0u8; 32]);
        io.write_bytes(&[0]); // session id len
        io.write_bytes(&2u16.to_be_bytes());
        io.write_bytes(&0xBEEFu16.to_be_bytes());
        io.write_bytes(&[1, 0]); // compression methods

        let server_offered = vec![0xc014u16];
        let mut cv = 0u8;
        let mut sv = 0u8;
        let mut av = 0u8;
        let mut est = false;
        let mut pending = Pending::default();
        let mut next = HandshakeState::ClientHello;
        let mut random = FixedRandom;
        let prf = NullPrf;
        let mut ctx = make_ctx(
            &mut io, &mut cv, &mut sv, &mut av, &mut est, &mut pending, &server_offered, &mut next,
            &mut random, &prf,
        );

        let err = recv(&mut ctx).unwrap_err();
        assert!(matches!(err, HandshakeError::CipherMismatch));
    }
}
