//! TLS alert types and dispatch.
//!
//! Grounded in `tls/alert.rs` (`tls_enum_u8!(AlertLevel ...)`,
//! `tls_enum_u8!(AlertDescription ...)`), re-expressed as plain `#[repr(u8)]`
//! enums with `TryFrom<u8>` since `tls_enum_u8!` lives in the `macros` crate
//! not carried over here (see DESIGN.md).

use std::convert::TryFrom;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

impl TryFrom<u8> for AlertLevel {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, ()> {
        match v {
            1 => Ok(AlertLevel::Warning),
            2 => Ok(AlertLevel::Fatal),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    RecordOverflow = 22,
    HandshakeFailure = 40,
    BadCertificate = 42,
    UnsupportedCertificate = 43,
    CertificateRevoked = 44,
    CertificateExpired = 45,
    CertificateUnknown = 46,
    IllegalParameter = 47,
    UnknownCa = 48,
    AccessDenied = 49,
    DecodeError = 50,
    DecryptError = 51,
    ProtocolVersion = 70,
    InsufficientSecurity = 71,
    InternalError = 80,
    UserCanceled = 90,
    NoRenegotiation = 100,
}

#[derive(Debug, Clone, Copy)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn parse(bytes: &[u8]) -> Option<Alert> {
        if bytes.len() != 2 {
            return None;
        }
        let level = AlertLevel::try_from(bytes[0]).ok()?;
        let description = match bytes[1] {
            0 => AlertDescription::CloseNotify,
            10 => AlertDescription::UnexpectedMessage,
            20 => AlertDescription::BadRecordMac,
            22 => AlertDescription::RecordOverflow,
            40 => AlertDescription::HandshakeFailure,
            42 => AlertDescription::BadCertificate,
            43 => AlertDescription::UnsupportedCertificate,
            44 => AlertDescription::CertificateRevoked,
            45 => AlertDescription::CertificateExpired,
            46 => AlertDescription::CertificateUnknown,
            47 => AlertDescription::IllegalParameter,
            48 => AlertDescription::UnknownCa,
            49 => AlertDescription::AccessDenied,
            50 => AlertDescription::DecodeError,
            51 => AlertDescription::DecryptError,
            70 => AlertDescription::ProtocolVersion,
            71 => AlertDescription::InsufficientSecurity,
            80 => AlertDescription::InternalError,
            90 => AlertDescription::UserCanceled,
            100 => AlertDescription::NoRenegotiation,
            _ => return None,
        };
        Some(Alert { level, description })
    }
}

/// The alert collaborator: dispatch, not policy. The core calls
/// `process_alert_fragment` on every inbound alert record and
/// `queue_reader_alert` when it wants to raise one of its own; what happens
/// to the connection as a result is left to this collaborator.
pub trait AlertSubsystem {
    fn process_alert_fragment(&mut self, payload: &[u8]);
    fn queue_reader_alert(&mut self, description: AlertDescription);
}

/// A no-op subsystem: logs and drops. Used by tests and as a sane default;
/// alert policy beyond dispatch is explicitly deferred to the caller.
#[derive(Default)]
pub struct LoggingAlertSubsystem;

impl AlertSubsystem for LoggingAlertSubsystem {
    fn process_alert_fragment(&mut self, payload: &[u8]) {
        match Alert::parse(payload) {
            Some(alert) => log::warn!("received alert: {:?}/{:?}", alert.level, alert.description),
            None => log::warn!("received malformed alert fragment ({} bytes)", payload.len()),
        }
    }

    fn queue_reader_alert(&mut self, description: AlertDescription) {
        log::debug!("queuing local alert: {:?}", description);
    }
}
