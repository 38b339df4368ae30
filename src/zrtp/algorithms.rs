//! Algorithm identifiers exchanged in Hello/Commit (RFC 6189 §5.1.2): each
//! is a fixed 4-ASCII-character tag. Only one value per family is actually
//! implemented (matching `srtp::SrtpProfile`'s single-variant pattern); the
//! tag round-trip still validates against the full RFC vocabulary so a
//! Hello naming an unsupported algorithm is rejected cleanly rather than
//! silently coerced.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    S256,
}

impl HashAlgorithm {
    pub const fn tag(self) -> [u8; 4] {
        match self {
            HashAlgorithm::S256 => *b"S256",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"S256" => Some(HashAlgorithm::S256),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherAlgorithm {
    Aes1,
}

impl CipherAlgorithm {
    pub const fn tag(self) -> [u8; 4] {
        match self {
            CipherAlgorithm::Aes1 => *b"AES1",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"AES1" => Some(CipherAlgorithm::Aes1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTagType {
    Hs80,
}

impl AuthTagType {
    pub const fn tag(self) -> [u8; 4] {
        match self {
            AuthTagType::Hs80 => *b"HS80",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"HS80" => Some(AuthTagType::Hs80),
            _ => None,
        }
    }
}

/// Key-agreement algorithm. Only Curve25519 ECDH is implemented — grounded
/// on `x25519-dalek`, which the retrieval pack's P2P messaging example
/// already depends on for the same purpose; the RFC's finite-field
/// DH-3072/DH-4096 modes would need a bignum-modexp crate none of the
/// pack's examples carry, so they are not offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAgreementAlgorithm {
    Ec25,
}

impl KeyAgreementAlgorithm {
    pub const fn tag(self) -> [u8; 4] {
        match self {
            KeyAgreementAlgorithm::Ec25 => *b"EC25",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"EC25" => Some(KeyAgreementAlgorithm::Ec25),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SasType {
    B32,
}

impl SasType {
    pub const fn tag(self) -> [u8; 4] {
        match self {
            SasType::B32 => *b"B32 ",
        }
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Self> {
        match tag {
            b"B32 " => Some(SasType::B32),
            _ => None,
        }
    }
}
