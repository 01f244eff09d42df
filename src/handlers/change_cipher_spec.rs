//! ChangeCipherSpec: not a handshake-type message, a record of its own
//! content type, whose body the protocol fixes to a single byte with value
//! 1. The driver is responsible for rejecting any other length at the
//! record level; this handler re-checks the byte value since a 1-byte
//! record with the wrong value would otherwise sail through unnoticed.

use crate::collaborators::{Prf, SecureRandom};
use crate::error::{HandshakeError, Result};
use crate::handlers::HandshakeCtx;
use crate::state::HandshakeState;

const CHANGE_CIPHER_SPEC_VALUE: u8 = 1;

pub fn send<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>, next_state: HandshakeState) -> Result<()> {
    ctx.handshake_io.write_bytes(&[CHANGE_CIPHER_SPEC_VALUE]);
    *ctx.next_state = next_state;
    Ok(())
}

pub fn recv<R: SecureRandom, P: Prf>(ctx: &mut HandshakeCtx<R, P>, next_state: HandshakeState) -> Result<()> {
    if ctx.handshake_io.data_available() != 1 {
        return Err(HandshakeError::bad_message("change cipher spec must be one byte"));
    }
    let value = ctx.handshake_io.read_bytes(1)?[0];
    if value != CHANGE_CIPHER_SPEC_VALUE {
        return Err(HandshakeError::bad_message("change cipher spec has wrong value"));
    }
    *ctx.next_state = next_state;
    Ok(())
}
