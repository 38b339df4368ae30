/// Cipher suite negotiated for a session. Only `AES128_CM_SHA1_80` (RFC 3711
/// §4.1.2, the mandatory-to-implement profile) is supported; the type exists
/// so a session config reads the same way regardless of how narrow the
/// current support is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SrtpProfile {
    #[default]
    Aes128CmSha1_80,
}
