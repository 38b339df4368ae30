//! Rolling hash chain H0..H3 (RFC 6189 §4.4.1.1): H0 is randomly generated,
//! each Hn = SHA-256(H(n-1)). H3 is disclosed first (in Hello), committing
//! to H2, H1, H0 disclosed in later messages without ever sending H0 itself
//! until Confirm — letting the peer verify each later disclosure hashes to
//! the one already committed.

use sha2::{Digest, Sha256};

pub const HASH_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct HashChain {
    pub h0: [u8; HASH_LEN],
    pub h1: [u8; HASH_LEN],
    pub h2: [u8; HASH_LEN],
    pub h3: [u8; HASH_LEN],
}

impl HashChain {
    pub fn generate() -> Self {
        let mut h0 = [0u8; HASH_LEN];
        rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut h0);
        Self::from_h0(h0)
    }

    pub fn from_h0(h0: [u8; HASH_LEN]) -> Self {
        let h1 = sha256(&h0);
        let h2 = sha256(&h1);
        let h3 = sha256(&h2);
        Self { h0, h1, h2, h3 }
    }
}

pub fn sha256(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Verifies that `child` hashes forward to `parent`, i.e. `sha256(child) == parent`.
pub fn verify_link(parent: &[u8; HASH_LEN], child: &[u8; HASH_LEN]) -> bool {
    sha256(child) == *parent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_links_verify_forward() {
        let chain = HashChain::generate();
        assert!(verify_link(&chain.h1, &chain.h0));
        assert!(verify_link(&chain.h2, &chain.h1));
        assert!(verify_link(&chain.h3, &chain.h2));
    }

    #[test]
    fn tampered_disclosure_fails_verification() {
        let chain = HashChain::generate();
        let mut bad_h0 = chain.h0;
        bad_h0[0] ^= 1;
        assert!(!verify_link(&chain.h1, &bad_h0));
    }
}
