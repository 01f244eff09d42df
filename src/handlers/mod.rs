//! Per-message handlers.
//!
//! Per-message handlers — one-shot functions that read/write
//! `conn.handshake_io` and set `conn.handshake.next_state` — are themselves
//! an external collaborator interface, not core logic. This mirrors the
//! `state_machine[].handler[mode]` function-pointer pairs in
//! `s2n_handshake_io.c`, expressed here as trait methods so a caller can
//! swap in real certificate/key-exchange/PRF logic without touching the
//! driver. `server_hello.rs` is transcribed field-for-field from
//! `s2n_server_hello.c`. The remaining messages (`client_hello.rs`,
//! `certificate.rs`, `key_exchange.rs`, `change_cipher_spec.rs`,
//! `finished.rs`) are minimal-but-real implementations — enough to drive a
//! full handshake in tests — built to treat cipher-suite-specific bodies as
//! opaque blobs, the way `Handshake::ServerKeyExchange { data: Bytes }` /
//! `ClientKeyExchange { data: Bytes }` do in `tls/handshake.rs`.

pub mod certificate;
pub mod change_cipher_spec;
pub mod client_hello;
pub mod finished;
pub mod key_exchange;
pub mod server_hello;

use crate::collaborators::{Prf, SecureRandom};
use crate::connection::{Pending, SignatureDigestAlg};
use crate::error::Result;
use crate::state::{HandshakeState, Mode};
use crate::stuffer::Stuffer;

/// Everything a per-message handler needs, bundled so handlers never touch
/// the handshake-driving fields (`state`, the record layer, the transcript)
/// directly — only the driver advances those.
pub struct HandshakeCtx<'a, R: SecureRandom, P: Prf> {
    pub handshake_io: &'a mut Stuffer,
    pub mode: Mode,
    pub client_protocol_version: &'a mut u8,
    pub server_protocol_version: &'a mut u8,
    pub actual_protocol_version: &'a mut u8,
    pub actual_protocol_version_established: &'a mut bool,
    pub pending: &'a mut Pending,
    pub offered_cipher_suites: &'a [u16],
    pub next_state: &'a mut HandshakeState,
    pub random: &'a mut R,
    pub prf: &'a P,
    pub transcript_hash_for_finished: &'a [u8],
    pub min_protocol_version: u8,
    pub max_protocol_version: u8,
}

pub fn signature_digest_alg_for(version: u8) -> SignatureDigestAlg {
    if version == crate::connection::TLS_1_2 {
        SignatureDigestAlg::Sha1
    } else {
        SignatureDigestAlg::Md5Sha1
    }
}

/// The per-message handler collaborator: one send/recv pair per wired FSM
/// entry. `ServerCertReq`, `ClientCert`, and `ClientCertVerify` have no
/// entries because the reference table treats them as optional
/// pass-throughs, exactly like `{NULL, NULL}` in `state_machine[]`.
pub trait HandshakeHandlers<R: SecureRandom, P: Prf> {
    fn client_hello_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn client_hello_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_hello_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_hello_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_cert_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_cert_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_cert_status_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_cert_status_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_key_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_key_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_hello_done_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_hello_done_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn client_key_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn client_key_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn client_change_cipher_spec_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn client_change_cipher_spec_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn client_finished_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn client_finished_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_change_cipher_spec_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_change_cipher_spec_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    fn server_finished_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
    fn server_finished_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;

    /// The SSLv2-compat ClientHello handler: legal only in `CLIENT_HELLO`,
    /// always server-side.
    fn sslv2_client_hello_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()>;
}

/// Minimal-but-real handler set: enough wire format to drive a full
/// handshake end to end, while leaving certificate validation, key-exchange
/// cryptography, and PRF derivation to the injected `Prf`/collaborator
/// traits.
#[derive(Default)]
pub struct DefaultHandshakeHandlers;

impl<R: SecureRandom, P: Prf> HandshakeHandlers<R, P> for DefaultHandshakeHandlers {
    fn client_hello_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        client_hello::send(ctx)
    }
    fn client_hello_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        client_hello::recv(ctx)
    }

    fn server_hello_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        server_hello::send(ctx)
    }
    fn server_hello_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        server_hello::recv(ctx)
    }

    fn server_cert_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        certificate::send(ctx, HandshakeState::ServerHelloDone)
    }
    fn server_cert_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        certificate::recv(ctx, HandshakeState::ServerHelloDone)
    }

    fn server_cert_status_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        certificate::status_send(ctx)
    }
    fn server_cert_status_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        certificate::status_recv(ctx)
    }

    fn server_key_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        key_exchange::server_key_send(ctx)
    }
    fn server_key_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        key_exchange::server_key_recv(ctx)
    }

    fn server_hello_done_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        certificate::hello_done_send(ctx)
    }
    fn server_hello_done_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        certificate::hello_done_recv(ctx)
    }

    fn client_key_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        key_exchange::client_key_send(ctx)
    }
    fn client_key_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        key_exchange::client_key_recv(ctx)
    }

    fn client_change_cipher_spec_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        change_cipher_spec::send(ctx, HandshakeState::ClientFinished)
    }
    fn client_change_cipher_spec_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        change_cipher_spec::recv(ctx, HandshakeState::ClientFinished)
    }

    fn client_finished_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        finished::send(ctx, "client finished", HandshakeState::ServerChangeCipherSpec)
    }
    fn client_finished_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        finished::recv(ctx, "client finished", HandshakeState::ServerChangeCipherSpec)
    }

    fn server_change_cipher_spec_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        change_cipher_spec::send(ctx, HandshakeState::ServerFinished)
    }
    fn server_change_cipher_spec_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        change_cipher_spec::recv(ctx, HandshakeState::ServerFinished)
    }

    fn server_finished_send(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        finished::send(ctx, "server finished", HandshakeState::HandshakeOver)
    }
    fn server_finished_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        finished::recv(ctx, "server finished", HandshakeState::HandshakeOver)
    }

    fn sslv2_client_hello_recv(&mut self, ctx: &mut HandshakeCtx<R, P>) -> Result<()> {
        client_hello::sslv2_recv(ctx)
    }
}
