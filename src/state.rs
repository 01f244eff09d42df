//! The handshake FSM: state enum, descriptor table, and transition/role
//! validators.
//!
//! Transcribed from the `state_machine[]` table and `validate_send_state` /
//! `validate_recv_state` / `validate_transition` in
//! `original_source/tls/s2n_handshake_io.c`. `tls/handshake.rs` favors the
//! same idea — a closed, exhaustive enum matched centrally rather than
//! virtual dispatch — for its `Handshake` message enum; this module applies
//! it to the *state* axis instead.
//!
//! `SERVER_CERT_STATUS` is wired in here as a legal successor of
//! `ServerCert`.

use crate::record::ContentType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Client,
    Server,
}

impl Mode {
    pub fn other(self) -> Mode {
        match self {
            Mode::Client => Mode::Server,
            Mode::Server => Mode::Client,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Writer {
    Client,
    Server,
    /// Terminal: no one writes, the handshake is over.
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HandshakeState {
    ClientHello,
    ServerHello,
    ServerCert,
    ServerCertStatus,
    ServerKey,
    ServerCertReq,
    ServerHelloDone,
    ClientCert,
    ClientKey,
    ClientCertVerify,
    ClientChangeCipherSpec,
    ClientFinished,
    ServerChangeCipherSpec,
    ServerFinished,
    HandshakeOver,
}

/// Declarative per-state descriptor.
#[derive(Debug, Clone, Copy)]
pub struct StateDescriptor {
    pub record_type: ContentType,
    /// Only meaningful when `record_type == Handshake`.
    pub message_type: u8,
    pub writer: Writer,
}

pub const TLS_CLIENT_HELLO: u8 = 1;
pub const TLS_SERVER_HELLO: u8 = 2;
pub const TLS_SERVER_CERT: u8 = 11;
pub const TLS_SERVER_CERT_STATUS: u8 = 22;
pub const TLS_SERVER_KEY: u8 = 12;
pub const TLS_SERVER_CERT_REQ: u8 = 13;
pub const TLS_SERVER_HELLO_DONE: u8 = 14;
pub const TLS_CLIENT_CERT: u8 = 11; // same wire value as SERVER_CERT
pub const TLS_CLIENT_KEY: u8 = 16;
pub const TLS_CLIENT_CERT_VERIFY: u8 = 15;
pub const TLS_FINISHED: u8 = 20; // same wire value both directions

impl HandshakeState {
    pub fn descriptor(self) -> StateDescriptor {
        use ContentType::*;
        use HandshakeState::*;
        use Writer::*;

        match self {
            ClientHello => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_CLIENT_HELLO,
                writer: Client,
            },
            ServerHello => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_SERVER_HELLO,
                writer: Server,
            },
            ServerCert => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_SERVER_CERT,
                writer: Server,
            },
            ServerCertStatus => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_SERVER_CERT_STATUS,
                writer: Server,
            },
            ServerKey => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_SERVER_KEY,
                writer: Server,
            },
            ServerCertReq => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_SERVER_CERT_REQ,
                writer: Server,
            },
            ServerHelloDone => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_SERVER_HELLO_DONE,
                writer: Server,
            },
            ClientCert => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_CLIENT_CERT,
                writer: Client,
            },
            ClientKey => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_CLIENT_KEY,
                writer: Client,
            },
            ClientCertVerify => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_CLIENT_CERT_VERIFY,
                writer: Client,
            },
            ClientChangeCipherSpec => StateDescriptor {
                record_type: ChangeCipherSpec,
                message_type: 0,
                writer: Client,
            },
            ClientFinished => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_FINISHED,
                writer: Client,
            },
            ServerChangeCipherSpec => StateDescriptor {
                record_type: ChangeCipherSpec,
                message_type: 0,
                writer: Server,
            },
            ServerFinished => StateDescriptor {
                record_type: Handshake,
                message_type: TLS_FINISHED,
                writer: Server,
            },
            HandshakeOver => StateDescriptor {
                record_type: ApplicationData,
                message_type: 0,
                writer: Both,
            },
        }
    }

    /// The exhaustive legal-transitions table.
    pub fn is_legal_transition(self, next: HandshakeState) -> bool {
        use HandshakeState::*;

        matches!(
            (self, next),
            (ClientHello, ServerHello)
                | (ServerHello, ServerCert)
                | (ServerHello, ServerKey)
                | (ServerHello, ServerCertReq)
                | (ServerHello, ServerHelloDone)
                | (ServerCert, ServerCertStatus)
                | (ServerCert, ServerKey)
                | (ServerCert, ServerCertReq)
                | (ServerCert, ServerHelloDone)
                | (ServerCertStatus, ServerKey)
                | (ServerCertStatus, ServerCertReq)
                | (ServerCertStatus, ServerHelloDone)
                | (ServerKey, ServerCertReq)
                | (ServerKey, ServerHelloDone)
                | (ServerHelloDone, ClientCert)
                | (ServerHelloDone, ClientKey)
                | (ClientCert, ClientKey)
                | (ClientKey, ClientCertVerify)
                | (ClientKey, ClientChangeCipherSpec)
                | (ClientCertVerify, ClientChangeCipherSpec)
                | (ClientChangeCipherSpec, ClientFinished)
                | (ClientFinished, ServerChangeCipherSpec)
                | (ServerChangeCipherSpec, ServerFinished)
                | (ServerFinished, HandshakeOver)
                | (HandshakeOver, HandshakeOver)
        )
    }
}

/// Send-role check: if we are about to write in this state, our mode must
/// match the state's declared writer (HANDSHAKE_OVER exempt, nobody writes
/// there).
pub fn validate_send_role(state: HandshakeState, mode: Mode) -> bool {
    match state.descriptor().writer {
        Writer::Client => mode == Mode::Client,
        Writer::Server => mode == Mode::Server,
        Writer::Both => true,
    }
}

/// Recv-role check: the dual of the above — we may only be reading in a
/// state the *other* role is expected to write.
pub fn validate_recv_role(state: HandshakeState, mode: Mode) -> bool {
    match state.descriptor().writer {
        Writer::Client => mode == Mode::Server,
        Writer::Server => mode == Mode::Client,
        Writer::Both => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HandshakeState::*;

    #[test]
    fn legal_chain_accepted() {
        assert!(ClientHello.is_legal_transition(ServerHello));
        assert!(ServerHello.is_legal_transition(ServerCert));
        assert!(ServerCert.is_legal_transition(ServerCertStatus));
        assert!(ServerCertStatus.is_legal_transition(ServerHelloDone));
        assert!(ServerHelloDone.is_legal_transition(ClientKey));
        assert!(ClientKey.is_legal_transition(ClientChangeCipherSpec));
        assert!(ClientChangeCipherSpec.is_legal_transition(ClientFinished));
        assert!(ClientFinished.is_legal_transition(ServerChangeCipherSpec));
        assert!(ServerChangeCipherSpec.is_legal_transition(ServerFinished));
        assert!(ServerFinished.is_legal_transition(HandshakeOver));
        assert!(HandshakeOver.is_legal_transition(HandshakeOver));
    }

    #[test]
    fn illegal_jump_rejected() {
        assert!(!ClientHello.is_legal_transition(HandshakeOver));
        assert!(!ServerHello.is_legal_transition(ClientKey));
    }

    #[test]
    fn role_checks_match_writer() {
        assert!(validate_send_role(ClientHello, Mode::Client));
        assert!(!validate_send_role(ClientHello, Mode::Server));
        assert!(validate_recv_role(ClientHello, Mode::Server));
        assert!(!validate_recv_role(ClientHello, Mode::Client));

        assert!(validate_send_role(ServerHello, Mode::Server));
        assert!(validate_recv_role(ServerHello, Mode::Client));

        assert!(validate_send_role(HandshakeOver, Mode::Client));
        assert!(validate_send_role(HandshakeOver, Mode::Server));
    }
}
