//! Rolling handshake-transcript digests.
//!
//! `tls/transcript.rs` buffers whole messages and hashes them lazily on
//! demand (`Transcript::push`/`hash`), which is fine for a TLS 1.3 flow
//! where the transcript hash is only ever read at a few fixed points. Here
//! the six digests must have absorbed exactly the concatenation of every
//! handshake message seen or sent so far at every instant, so they are
//! updated incrementally (one `update()` per absorbed range) instead of
//! buffered. Concrete algorithms come from the `md-5`, `sha1`, `sha2` crates
//! rather than a hand-rolled `crate::sha256`/`crate::md5` (those live in
//! parts of the upstream crate not carried over here, see DESIGN.md).

use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;
use sha2::Digest as _;

/// One running digest. A thin seam so the six instances below can be
/// updated uniformly by the fan-out helper.
trait RollingDigest {
    fn update(&mut self, bytes: &[u8]);
}

impl RollingDigest for Md5 {
    fn update(&mut self, bytes: &[u8]) {
        md5::Digest::update(self, bytes)
    }
}
impl RollingDigest for Sha1 {
    fn update(&mut self, bytes: &[u8]) {
        sha1::Digest::update(self, bytes)
    }
}
impl RollingDigest for Sha256 {
    fn update(&mut self, bytes: &[u8]) {
        sha2::Digest::update(self, bytes)
    }
}

/// Six independent rolling digests: MD5+SHA-1 for pre-TLS1.2 PRFs, SHA-256
/// for the TLS 1.2 PRF, each maintained from the client's point of view and
/// the server's point of view separately (identical values absent
/// renegotiation, which this crate does not support).
pub struct TranscriptDigests {
    pub client_md5: Md5,
    pub client_sha1: Sha1,
    pub client_sha256: Sha256,
    pub server_md5: Md5,
    pub server_sha1: Sha1,
    pub server_sha256: Sha256,
}

impl TranscriptDigests {
    pub fn new() -> Self {
        Self {
            client_md5: Md5::default(),
            client_sha1: Sha1::default(),
            client_sha256: Sha256::default(),
            server_md5: Md5::default(),
            server_sha1: Sha1::default(),
            server_sha256: Sha256::default(),
        }
    }

    /// The single fan-out helper: absorbs `bytes` into all six digests.
    /// Every handshake byte, in either direction, passes through here
    /// exactly once.
    pub fn update_all(&mut self, bytes: &[u8]) {
        self.client_md5.update(bytes);
        self.client_sha1.update(bytes);
        self.client_sha256.update(bytes);
        self.server_md5.update(bytes);
        self.server_sha1.update(bytes);
        self.server_sha256.update(bytes);
    }

    pub fn client_md5_sha1(&self) -> Vec<u8> {
        let mut out = self.client_md5.clone().finalize().to_vec();
        out.extend_from_slice(&self.client_sha1.clone().finalize());
        out
    }

    pub fn client_sha256(&self) -> [u8; 32] {
        self.client_sha256.clone().finalize().into()
    }

    pub fn server_md5_sha1(&self) -> Vec<u8> {
        let mut out = self.server_md5.clone().finalize().to_vec();
        out.extend_from_slice(&self.server_sha1.clone().finalize());
        out
    }

    pub fn server_sha256(&self) -> [u8; 32] {
        self.server_sha256.clone().finalize().into()
    }
}

impl Default for TranscriptDigests {
    fn default() -> Self {
        Self::new()
    }
}
