//! Certificate, CertificateStatus (OCSP stapling) and ServerHelloDone.
//! Certificate and status bodies are carried as opaque blobs — validating a
//! certificate chain or an OCSP response is a collaborator concern — the
//! same way `Handshake::ServerKeyExchange { data: Bytes }` carries its body
//! without interpreting it.

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

pub fn send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>, next_state: HandshakeState) -> Result<()> {
    let chain = &ctx.pending.server_certificate;
    if chain.len() > U24_MAX {
        return Err(HandshakeError::bad_message("certificate chain too large"));
    }
    let mut len_buf = Vec::with_capacity(3);
    write_u24(&mut len_buf, chain.len());
    ctx.handshake_io.write_bytes(&len_buf);
    ctx.handshake_io.write_bytes(chain);

    *ctx.next_state = next_state;
    Ok(())
}

pub fn recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>, next_state: HandshakeState) -> Result<()> {
    let chain_len = read_u24(ctx)?;
    if chain_len > ctx.handshake_io.data_available() {
        return Err(HandshakeError::bad_message("certificate list overflow"));
    }
    ctx.pending.server_certificate = ctx.handshake_io.read_bytes(chain_len)?.to_vec();

    *ctx.next_state = next_state;
    Ok(())
}

const OCSP_STATUS_TYPE: u8 = 1;

pub fn status_send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let response = &ctx.pending.server_cert_status;
    if response.len() > U24_MAX {
        return Err(HandshakeError::bad_message("cert status response too large"));
    }
    ctx.handshake_io.write_bytes(&[OCSP_STATUS_TYPE]);
    let mut len_buf = Vec::with_capacity(3);
    write_u24(&mut len_buf, response.len());
    ctx.handshake_io.write_bytes(&len_buf);
    ctx.handshake_io.write_bytes(response);

    *ctx.next_state = HandshakeState::ServerKey;
    Ok(())
}

pub fn status_recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    let status_type = ctx.handshake_io.read_bytes(1)?[0];
    if status_type != OCSP_STATUS_TYPE {
        return Err(HandshakeError::bad_message("unsupported certificate status type"));
    }
    let response_len = read_u24(ctx)?;
    if response_len > ctx.handshake_io.data_available() {
        return Err(HandshakeError::bad_message("cert status response overflow"));
    }
    ctx.pending.server_cert_status = ctx.handshake_io.read_bytes(response_len)?.to_vec();

    *ctx.next_state = HandshakeState::ServerKey;
    Ok(())
}

pub fn hello_done_send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    *ctx.next_state = HandshakeState::ClientKey;
    Ok(())
}

pub fn hello_done_recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
    if !ctx.handshake_io.is_empty() {
        return Err(HandshakeError::bad_message("ServerHelloDone must be empty"));
    }
    *ctx.next_state = HandshakeState::ClientKey;
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

    fn make_ctx<'a>(
        io: &'a mut Stuffer,
        pending: &'a mut Pending,
        next: &'a mut HandshakeState,
        client_v: &'a mut u8,
        server_v: &'a mut u8,
        actual_v: &'a mut u8,
        established: &'a mut bool,
        offered: &'a [u16],
        random: &'a mut NoRandom,
        prf: &'a NullPrf,
    ) -> HandshakeCtx<'a, NoRandom, NullPrf> {
        HandshakeCtx {
            handshake_io: io,
            mode: Mode::Server,
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
    fn certificate_send_then_recv_roundtrips_opaque_chain() {
        let offered: Vec<u16> = vec![];
        let mut send_io = Stuffer::new();
        let mut pending = Pending {
            server_certificate: vec![0xDE, 0xAD, 0xBE, 0xEF],
            ..Default::default()
        };
        let mut next = HandshakeState::ServerCert;
        let (mut cv, mut sv, mut av, mut est) = (0u8, 0u8, 0u8, false);
        let mut random = NoRandom;
        let prf = NullPrf;
        {
            let mut ctx = make_ctx(
                &mut send_io, &mut pending, &mut next, &mut cv, &mut sv, &mut av, &mut est, &offered,
                &mut random, &prf,
            );
            send(&mut ctx, HandshakeState::ServerHelloDone).unwrap();
        }
        assert_eq!(next, HandshakeState::ServerHelloDone);

        let mut recv_io = Stuffer::new();
        recv_io.write_bytes(send_io.as_slice());
        let mut pending2 = Pending::default();
        let mut next2 = HandshakeState::ServerCert;
        let mut ctx2 = make_ctx(
            &mut recv_io, &mut pending2, &mut next2, &mut cv, &mut sv, &mut av, &mut est, &offered,
            &mut random, &prf,
        );
        recv(&mut ctx2, HandshakeState::ServerHelloDone).unwrap();

        assert_eq!(pending2.server_certificate, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(next2, HandshakeState::ServerHelloDone);
    }

    #[test]
    fn hello_done_recv_rejects_nonempty_body() {
        let offered: Vec<u16> = vec![];
        let mut io = Stuffer::new();
        io.write_bytes(&[1]);
        let mut pending = Pending::default();
        let mut next = HandshakeState::ServerHelloDone;
        let (mut cv, mut sv, mut av, mut est) = (0u8, 0u8, 0u8, false);
        let mut random = NoRandom;
        let prf = NullPrf;
        let mut ctx = make_ctx(
            &mut io, &mut pending, &mut next, &mut cv, &mut sv, &mut av, &mut est, &offered, &mut random,
            &prf,
        );
        assert!(hello_done_recv(&mut ctx).is_err());
    }
}
