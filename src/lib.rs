//! A TLS 1.0-1.2 handshake state machine and record-layer driver.
//!
//! This crate implements the handshake FSM, message reassembly, and
//! transcript hashing; it deliberately stops at the record boundary.
//! Certificate validation, key-exchange cryptography, PRF derivation and
//! bulk encryption are all external collaborators, injected as traits
//! (`RecordLayer`, `HandshakeHandlers`, `AlertSubsystem`, `SecureRandom`,
//! `Prf`) rather than built in.

pub mod alert;
pub mod collaborators;
pub mod connection;
pub mod digest;
pub mod driver;
pub mod error;
pub mod handlers;
pub mod handshake_message;
pub mod record;
pub mod state;
pub mod stuffer;

pub use alert::{Alert, AlertDescription, AlertLevel, AlertSubsystem, LoggingAlertSubsystem};
pub use collaborators::{NullPrf, OsRandom, Prf, SecureRandom};
pub use connection::{Connection, HandshakeConfig, InStatus, Pending, SignatureDigestAlg};
pub use driver::{negotiate, BlockedStatus};
pub use error::{HandshakeError, Result};
pub use handlers::{DefaultHandshakeHandlers, HandshakeHandlers};
pub use record::{ContentType, PlaintextRecordLayer, Record, RecordLayer};
pub use state::{HandshakeState, Mode};
