//! Finished: the 12-byte `verify_data` computed by the injected `Prf`
//! collaborator over the rolling transcript hash captured just before this
//! message. Key-schedule/PRF derivation itself is out of scope — this
//! handler only calls through the seam and checks the result.

use crate::collaborators::{Prf, SecureRandom};
use crate::error::{HandshakeError, Result};
use crate::handlers::HandshakeCtx;
use crate::state::HandshakeState;

const VERIFY_DATA_LEN: usize = 12;

pub fn send<R: SecureRandom, P: Prf>(
    ctx: &mut HandshakeCtx<R, P>,
    label: &'static str,
    next_state: HandshakeState,
) -> Result<()> {
    let verify_data = ctx.prf.verify_data(label, ctx.transcript_hash_for_finished)?;
    ctx.handshake_io.write_bytes(&verify_data);
    *ctx.next_state = next_state;
    Ok(())
}

pub fn recv<R: SecureRandom, P: Prf>(
    ctx: &mut HandshakeCtx<R, P>,
    label: &'static str,
    next_state: HandshakeState,
) -> Result<()> {
    if ctx.handshake_io.data_available() != VERIFY_DATA_LEN {
        return Err(HandshakeError::bad_message("finished message has wrong length"));
    }
    let received = ctx.handshake_io.read_bytes(VERIFY_DATA_LEN)?.to_vec();
    let expected = ctx.prf.verify_data(label, ctx.transcript_hash_for_finished)?;
    if received != expected {
        return Err(HandshakeError::bad_message("finished verify_data mismatch"));
    }
    *ctx.next_state = next_state;
    Ok(())
}
