//! ServerKeyExchange / ClientKeyExchange: cipher-suite-specific bodies
//! (DH params, EC points, encrypted premaster secrets, ...) carried as
//! opaque blobs, the same way `Handshake::ServerKeyExchange { data: Bytes }`
//! / `ClientKeyExchange { data: Bytes }` do in `tls/handshake.rs` — the
//! actual key-exchange cryptography is a collaborator concern.

use crate::collaborators::{Prf, SecureRandom};
use crate::error::{HandshakeError, Result};
use crate::handlers::HandshakeCtx;
use crate::state::HandshakeState;

const U24_MAX: usize = (1 << 24) - 1;

fn write_u24(out: &mut Vec<u8>, len: usize) {
    let bytes = (len as u32).to_be_bytes();
    out.extend_from_slice(&bytes[1..]);
}

fn read_u24<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<usize> {
    let b = ctx.handshake_io.read_bytes(3)?;
    Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]) as usize)
}

pub fn server_key_send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let blob = &ctx.pending.server_key_exchange;
    if blob.len() > U24_MAX {
        return Err(HandshakeError::bad_message("server key exchange body too large"));
    }
    let mut len_buf = Vec::with_capacity(3);
    write_u24(&mut len_buf, blob.len());
    ctx.handshake_io.write_bytes(&len_buf);
    ctx.handshake_io.write_bytes(blob);

    *ctx.next_state = HandshakeState::ServerHelloDone;
    Ok(())
}

pub fn server_key_recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let len = read_u24(ctx)?;
    if len > ctx.handshake_io.data_available() {
        return Err(HandshakeError::bad_message("server key exchange overflow"));
    }
    ctx.pending.server_key_exchange = ctx.handshake_io.read_bytes(len)?.to_vec();

    *ctx.next_state = HandshakeState::ServerHelloDone;
    Ok(())
}

pub fn client_key_send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let blob = &ctx.pending.client_key_exchange;
    if blob.len() > U24_MAX {
        return Err(HandshakeError::bad_message("client key exchange body too large"));
    }
    let mut len_buf = Vec::with_capacity(3);
    write_u24(&mut len_buf, blob.len());
    ctx.handshake_io.write_bytes(&len_buf);
    ctx.handshake_io.write_bytes(blob);

    *ctx.next_state = HandshakeState::ClientChangeCipherSpec;
    Ok(())
}

pub fn client_key_recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let len = read_u24(ctx)?;
    if len > ctx.handshake_io.data_available() {
        return Err(HandshakeError::bad_message("client key exchange overflow"));
    }
    ctx.pending.client_key_exchange = ctx.handshake_io.read_bytes(len)?.to_vec();

    *ctx.next_state = HandshakeState::ClientChangeCipherSpec;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::NullPrf;
    use crate::connection::{Pending, SSLV3, TLS_1_2};
    use crate::state::Mode;
    use crate::stuffer::Stuffer;

    struct NoRandom;
    impl SecureRandom for NoRandom {
        fn fill(&mut self, _buf: &mut [u8]) {}
    }

    #[test]
    fn client_key_send_then_recv_roundtrips_opaque_blob() {
        let offered: Vec<u16> = vec![];
        let mut send_io = Stuffer::new();
        let mut pending = Pending {
            client_key_exchange: vec![1, 2, 3, 4, 5],
            ..Default::default()
        };
        let mut next = HandshakeState::ClientKey;
        let (mut cv, mut sv, mut av, mut est) = (0u8, 0u8, 0u8, false);
        let mut random = NoRandom;
        let prf = NullPrf;
        {
            let mut ctx = HandshakeCtx {
                handshake_io: &mut send_io,
                mode: Mode::Client,
                client_protocol_version: &mut cv,
                server_protocol_version: &mut sv,
                actual_protocol_version: &mut av,
                actual_protocol_version_established: &mut est,
                pending: &mut pending,
                offered_cipher_suites: &offered,
                next_state: &mut next,
                random: &mut random,
                prf: &prf,
                transcript_hash_for_finished: &[],
                min_protocol_version: SSLV3,
                max_protocol_version: TLS_1_2,
            };
            client_key_send(&mut ctx).unwrap();
        }
        assert_eq!(next, HandshakeState::ClientChangeCipherSpec);

        let mut recv_io = Stuffer::new();
        recv_io.write_bytes(send_io.as_slice());
        let mut pending2 = Pending::default();
        let mut next2 = HandshakeState::ClientKey;
        let mut ctx2 = HandshakeCtx {
            handshake_io: &mut recv_io,
            mode: Mode::Server,
            client_protocol_version: &mut cv,
            server_protocol_version: &mut sv,
            actual_protocol_version: &mut av,
            actual_protocol_version_established: &mut est,
            pending: &mut pending2,
            offered_cipher_suites: &offered,
            next_state: &mut next2,
            random: &mut random,
            prf: &prf,
            transcript_hash_for_finished: &[],
            min_protocol_version: SSLV3,
            max_protocol_version: TLS_1_2,
        };
        client_key_recv(&mut ctx2).unwrap();

        assert_eq!(pending2.client_key_exchange, vec![1, 2, 3, 4, 5]);
        assert_eq!(next2, HandshakeState::ClientChangeCipherSpec);
    }
}
