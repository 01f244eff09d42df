//! External collaborators this crate delegates to and does not specify the
//! internals of: secure randomness and the PRF/key-schedule used to compute
//! the Finished `verify_data`. Concrete cryptography, certificate
//! validation, and key exchange are all out of this crate's scope; these
//! traits are the seams the core calls through, the same way
//! `DiffieHellmanFn`/`x509::PrivateKey` are injected rather than
//! hard-coding an algorithm (`tls/handshake_executor.rs`).

use crate::error::Result;

/// Supplies the 28-byte random tail of `server_random`/`client_random`.
/// Out of scope: the RNG's own entropy source.
pub trait SecureRandom {
    fn fill(&mut self, buf: &mut [u8]);
}

pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill(&mut self, buf: &mut [u8]) {
        use rand::RngCore;
        rand::thread_rng().fill_bytes(buf);
    }
}

/// Computes a Finished message's `verify_data` from a transcript hash and a
/// per-session secret. PRF/key-schedule derivation is explicitly out of
/// scope; this is the collaborator seam.
pub trait Prf {
    fn verify_data(&self, label: &'static str, transcript_hash: &[u8]) -> Result<[u8; 12]>;
}

/// A `Prf` that deterministically folds the transcript hash into 12 bytes.
/// Not cryptographically meaningful — stands in for the real PRF in tests
/// and demonstrations where no master secret has actually been negotiated.
#[derive(Default)]
pub struct NullPrf;

impl Prf for NullPrf {
    fn verify_data(&self, label: &'static str, transcript_hash: &[u8]) -> Result<[u8; 12]> {
        let mut out = [0u8; 12];
        let label_bytes = label.as_bytes();
        for (i, b) in out.iter_mut().enumerate() {
            let th = transcript_hash.get(i % transcript_hash.len().max(1)).copied().unwrap_or(0);
            let lb = label_bytes.get(i % label_bytes.len().max(1)).copied().unwrap_or(0);
            *b = th ^ lb;
        }
        Ok(out)
    }
}
