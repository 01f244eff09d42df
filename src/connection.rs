//! The per-connection data model.

use crate::alert::AlertSubsystem;
use crate::collaborators::{Prf, SecureRandom};
use crate::digest::TranscriptDigests;
use crate::handlers::HandshakeHandlers;
use crate::record::RecordLayer;
use crate::state::{HandshakeState, Mode};
use crate::stuffer::Stuffer;

pub const SSLV3: u8 = 30; // major*10 + minor encoding: {3,0}
pub const TLS_1_2: u8 = 33; // {3,3}

/// Caller-supplied negotiation bounds, passed into `Connection::new`. Plays
/// the role `ClientOptions`/`ServerOptions` play for TLS 1.3, generalized to
/// the simpler version-range negotiation this crate drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeConfig {
    pub min_protocol_version: u8,
    pub max_protocol_version: u8,
    /// Caps accepted handshake message bodies independent of the
    /// 2²⁴−1 wire-implied ceiling.
    pub max_handshake_message_len: usize,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            min_protocol_version: SSLV3,
            max_protocol_version: TLS_1_2,
            max_handshake_message_len: crate::handshake_message::MAX_HANDSHAKE_MESSAGE_LEN,
        }
    }
}

/// Negotiation parameters that become the active session once the
/// handshake completes. Named `pending` because these are "in negotiation"
/// until `HANDSHAKE_OVER`.
#[derive(Debug, Default, Clone)]
pub struct Pending {
    pub server_random: [u8; 32],
    pub client_random: [u8; 32],
    pub cipher_suite: Option<u16>,
    pub signature_digest_alg: Option<SignatureDigestAlg>,

    /// Opaque message bodies whose contents are a collaborator concern
    /// (certificate validation, key exchange cryptography): carried as raw
    /// bytes the way `Handshake::ServerKeyExchange { data: Bytes }` carries
    /// its body without interpreting it.
    pub server_certificate: Vec<u8>,
    pub server_cert_status: Vec<u8>,
    pub server_key_exchange: Vec<u8>,
    pub client_key_exchange: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureDigestAlg {
    Md5Sha1,
    Sha1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InStatus {
    /// The current record's header has not yet been consumed.
    Encrypted,
    /// A plaintext record header has been consumed; body reassembly may be
    /// in progress.
    PlaintextHeaderConsumed,
}

pub struct Connection<L: RecordLayer, H: HandshakeHandlers<R, P>, A: AlertSubsystem, R: SecureRandom, P: Prf> {
    pub mode: Mode,
    pub state: HandshakeState,
    pub next_state: HandshakeState,

    pub client_protocol_version: u8,
    pub server_protocol_version: u8,
    pub actual_protocol_version: u8,
    pub actual_protocol_version_established: bool,

    pub offered_cipher_suites: Vec<u16>,

    pub pending: Pending,

    pub handshake_io: Stuffer,
    pub in_buf: Stuffer,
    pub out_buf: Stuffer,
    pub header_in: Stuffer,

    pub in_status: InStatus,

    pub transcript: TranscriptDigests,

    pub closed: bool,

    /// Set once the current outgoing message has been handed to the record
    /// layer but a flush is still pending (`blocked_on_write`). Guards
    /// against re-running the handler and re-queuing the message on resume.
    pub write_queued: bool,

    pub record_layer: L,
    pub handlers: H,
    pub alerts: A,
    pub random: R,
    pub prf: P,

    pub config: HandshakeConfig,
}

impl<L: RecordLayer, H: HandshakeHandlers<R, P>, A: AlertSubsystem, R: SecureRandom, P: Prf> Connection<L, H, A, R, P> {
    pub fn new(mode: Mode, record_layer: L, handlers: H, alerts: A, random: R, prf: P) -> Self {
        Self::with_config(mode, record_layer, handlers, alerts, random, prf, HandshakeConfig::default())
    }

    pub fn with_config(
        mode: Mode,
        record_layer: L,
        handlers: H,
        alerts: A,
        random: R,
        prf: P,
        config: HandshakeConfig,
    ) -> Self {
        Self {
            mode,
            state: HandshakeState::ClientHello,
            next_state: HandshakeState::ClientHello,
            client_protocol_version: 0,
            server_protocol_version: 0,
            actual_protocol_version: config.max_protocol_version,
            actual_protocol_version_established: false,
            offered_cipher_suites: Vec::new(),
            pending: Pending::default(),
            handshake_io: Stuffer::new(),
            in_buf: Stuffer::new(),
            out_buf: Stuffer::new(),
            header_in: Stuffer::new(),
            in_status: InStatus::Encrypted,
            transcript: TranscriptDigests::new(),
            closed: false,
            write_queued: false,
            record_layer,
            handlers,
            alerts,
            random,
            prf,
            config,
        }
    }
}
