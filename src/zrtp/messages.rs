//! ZRTP message (de)serialization (RFC 6189 §5). Each message is a fixed
//! 8-byte ASCII type tag followed by type-specific fields and a trailing
//! CRC-32 (`crc::append_crc`/`strip_and_verify_crc`). Multi-octet integers
//! are network-byte-order, matching every other wire format in this crate.

use crate::zrtp::algorithms::{
    AuthTagType, CipherAlgorithm, HashAlgorithm, KeyAgreementAlgorithm, SasType,
};
use crate::zrtp::crc;
use crate::zrtp::zrtp_error::ZrtpError;

pub const ZID_LEN: usize = 12;
pub const HASH_LEN: usize = 32;

fn read_tag(buf: &[u8]) -> Result<([u8; 8], &[u8]), ZrtpError> {
    if buf.len() < 8 {
        return Err(ZrtpError::TooShort);
    }
    let mut tag = [0u8; 8];
    tag.copy_from_slice(&buf[..8]);
    Ok((tag, &buf[8..]))
}

fn read_array<const N: usize>(buf: &[u8]) -> Result<([u8; N], &[u8]), ZrtpError> {
    if buf.len() < N {
        return Err(ZrtpError::TooShort);
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[..N]);
    Ok((out, &buf[N..]))
}

fn read_u16(buf: &[u8]) -> Result<(u16, &[u8]), ZrtpError> {
    let (bytes, rest) = read_array::<2>(buf)?;
    Ok((u16::from_be_bytes(bytes), rest))
}

fn read_varbytes(buf: &[u8]) -> Result<(Vec<u8>, &[u8]), ZrtpError> {
    let (len, rest) = read_u16(buf)?;
    let len = len as usize;
    if rest.len() < len {
        return Err(ZrtpError::TooShort);
    }
    Ok((rest[..len].to_vec(), &rest[len..]))
}

fn write_varbytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u16).to_be_bytes());
    out.extend_from_slice(data);
}

#[derive(Debug, Clone)]
pub struct HelloMessage {
    pub zid: [u8; ZID_LEN],
    pub h3: [u8; HASH_LEN],
    pub hash: HashAlgorithm,
    pub cipher: CipherAlgorithm,
    pub auth: AuthTagType,
    pub keyagr: KeyAgreementAlgorithm,
    pub sas: SasType,
}

#[derive(Debug, Clone)]
pub struct CommitMessage {
    pub zid: [u8; ZID_LEN],
    pub hash: HashAlgorithm,
    pub cipher: CipherAlgorithm,
    pub auth: AuthTagType,
    pub keyagr: KeyAgreementAlgorithm,
    pub sas: SasType,
    /// Hash of the initiator's DHPart2, committing to its DH public value
    /// before the responder has seen it (RFC 6189 §5.1.5's `hvi`).
    pub hvi: [u8; HASH_LEN],
}

#[derive(Debug, Clone)]
pub struct DhPartMessage {
    /// Sender's ECDH public value (32 octets for Curve25519).
    pub pv: Vec<u8>,
    pub h1: [u8; HASH_LEN],
}

#[derive(Debug, Clone)]
pub struct ConfirmMessage {
    pub h0: [u8; HASH_LEN],
    /// Truncated HMAC over `h0` under a key derived from `s0`, authenticating
    /// this Confirm to the peer that already shares `s0`.
    pub mac: [u8; 8],
}

#[derive(Debug, Clone)]
pub struct ErrorMessage {
    pub code: u32,
}

#[derive(Debug, Clone)]
pub enum ZrtpMessage {
    Hello(HelloMessage),
    HelloAck,
    Commit(CommitMessage),
    DhPart1(DhPartMessage),
    DhPart2(DhPartMessage),
    Confirm1(ConfirmMessage),
    Confirm2(ConfirmMessage),
    Conf2Ack,
    Error(ErrorMessage),
}

const TAG_HELLO: &[u8; 8] = b"Hello   ";
const TAG_HELLOACK: &[u8; 8] = b"HelloACK";
const TAG_COMMIT: &[u8; 8] = b"Commit  ";
const TAG_DHPART1: &[u8; 8] = b"DHPart1 ";
const TAG_DHPART2: &[u8; 8] = b"DHPart2 ";
const TAG_CONFIRM1: &[u8; 8] = b"Confirm1";
const TAG_CONFIRM2: &[u8; 8] = b"Confirm2";
const TAG_CONF2ACK: &[u8; 8] = b"Conf2ACK";
const TAG_ERROR: &[u8; 8] = b"Error   ";

impl ZrtpMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            ZrtpMessage::Hello(h) => {
                out.extend_from_slice(TAG_HELLO);
                out.extend_from_slice(&h.zid);
                out.extend_from_slice(&h.h3);
                out.extend_from_slice(&h.hash.tag());
                out.extend_from_slice(&h.cipher.tag());
                out.extend_from_slice(&h.auth.tag());
                out.extend_from_slice(&h.keyagr.tag());
                out.extend_from_slice(&h.sas.tag());
            }
            ZrtpMessage::HelloAck => out.extend_from_slice(TAG_HELLOACK),
            ZrtpMessage::Commit(c) => {
                out.extend_from_slice(TAG_COMMIT);
                out.extend_from_slice(&c.zid);
                out.extend_from_slice(&c.hash.tag());
                out.extend_from_slice(&c.cipher.tag());
                out.extend_from_slice(&c.auth.tag());
                out.extend_from_slice(&c.keyagr.tag());
                out.extend_from_slice(&c.sas.tag());
                out.extend_from_slice(&c.hvi);
            }
            ZrtpMessage::DhPart1(d) | ZrtpMessage::DhPart2(d) => {
                let tag = if matches!(self, ZrtpMessage::DhPart1(_)) {
                    TAG_DHPART1
                } else {
                    TAG_DHPART2
                };
                out.extend_from_slice(tag);
                write_varbytes(&mut out, &d.pv);
                out.extend_from_slice(&d.h1);
            }
            ZrtpMessage::Confirm1(c) | ZrtpMessage::Confirm2(c) => {
                let tag = if matches!(self, ZrtpMessage::Confirm1(_)) {
                    TAG_CONFIRM1
                } else {
                    TAG_CONFIRM2
                };
                out.extend_from_slice(tag);
                out.extend_from_slice(&c.h0);
                out.extend_from_slice(&c.mac);
            }
            ZrtpMessage::Conf2Ack => out.extend_from_slice(TAG_CONF2ACK),
            ZrtpMessage::Error(e) => {
                out.extend_from_slice(TAG_ERROR);
                out.extend_from_slice(&e.code.to_be_bytes());
            }
        }
        crc::append_crc(&mut out);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ZrtpError> {
        let body = crc::strip_and_verify_crc(buf).ok_or(ZrtpError::BadCrc)?;
        let (tag, rest) = read_tag(body)?;

        if &tag == TAG_HELLO {
            let (zid, rest) = read_array::<ZID_LEN>(rest)?;
            let (h3, rest) = read_array::<HASH_LEN>(rest)?;
            let (hash_tag, rest) = read_array::<4>(rest)?;
            let (cipher_tag, rest) = read_array::<4>(rest)?;
            let (auth_tag, rest) = read_array::<4>(rest)?;
            let (keyagr_tag, rest) = read_array::<4>(rest)?;
            let (sas_tag, _rest) = read_array::<4>(rest)?;
            Ok(ZrtpMessage::Hello(HelloMessage {
                zid,
                h3,
                hash: HashAlgorithm::from_tag(&hash_tag).ok_or(ZrtpError::NoCommonAlgorithm)?,
                cipher: CipherAlgorithm::from_tag(&cipher_tag)
                    .ok_or(ZrtpError::NoCommonAlgorithm)?,
                auth: AuthTagType::from_tag(&auth_tag).ok_or(ZrtpError::NoCommonAlgorithm)?,
                keyagr: KeyAgreementAlgorithm::from_tag(&keyagr_tag)
                    .ok_or(ZrtpError::NoCommonAlgorithm)?,
                sas: SasType::from_tag(&sas_tag).ok_or(ZrtpError::NoCommonAlgorithm)?,
            }))
        } else if &tag == TAG_HELLOACK {
            Ok(ZrtpMessage::HelloAck)
        } else if &tag == TAG_COMMIT {
            let (zid, rest) = read_array::<ZID_LEN>(rest)?;
            let (hash_tag, rest) = read_array::<4>(rest)?;
            let (cipher_tag, rest) = read_array::<4>(rest)?;
            let (auth_tag, rest) = read_array::<4>(rest)?;
            let (keyagr_tag, rest) = read_array::<4>(rest)?;
            let (sas_tag, rest) = read_array::<4>(rest)?;
            let (hvi, _rest) = read_array::<HASH_LEN>(rest)?;
            Ok(ZrtpMessage::Commit(CommitMessage {
                zid,
                hash: HashAlgorithm::from_tag(&hash_tag).ok_or(ZrtpError::NoCommonAlgorithm)?,
                cipher: CipherAlgorithm::from_tag(&cipher_tag)
                    .ok_or(ZrtpError::NoCommonAlgorithm)?,
                auth: AuthTagType::from_tag(&auth_tag).ok_or(ZrtpError::NoCommonAlgorithm)?,
                keyagr: KeyAgreementAlgorithm::from_tag(&keyagr_tag)
                    .ok_or(ZrtpError::NoCommonAlgorithm)?,
                sas: SasType::from_tag(&sas_tag).ok_or(ZrtpError::NoCommonAlgorithm)?,
                hvi,
            }))
        } else if &tag == TAG_DHPART1 || &tag == TAG_DHPART2 {
            let (pv, rest) = read_varbytes(rest)?;
            let (h1, _rest) = read_array::<HASH_LEN>(rest)?;
            let msg = DhPartMessage { pv, h1 };
            Ok(if &tag == TAG_DHPART1 {
                ZrtpMessage::DhPart1(msg)
            } else {
                ZrtpMessage::DhPart2(msg)
            })
        } else if &tag == TAG_CONFIRM1 || &tag == TAG_CONFIRM2 {
            let (h0, rest) = read_array::<HASH_LEN>(rest)?;
            let (mac, _rest) = read_array::<8>(rest)?;
            let msg = ConfirmMessage { h0, mac };
            Ok(if &tag == TAG_CONFIRM1 {
                ZrtpMessage::Confirm1(msg)
            } else {
                ZrtpMessage::Confirm2(msg)
            })
        } else if &tag == TAG_CONF2ACK {
            Ok(ZrtpMessage::Conf2Ack)
        } else if &tag == TAG_ERROR {
            let (code_bytes, _rest) = read_array::<4>(rest)?;
            Ok(ZrtpMessage::Error(ErrorMessage {
                code: u32::from_be_bytes(code_bytes),
            }))
        } else {
            Err(ZrtpError::UnknownMessageType(tag))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trips() {
        let hello = HelloMessage {
            zid: [1u8; ZID_LEN],
            h3: [2u8; HASH_LEN],
            hash: HashAlgorithm::S256,
            cipher: CipherAlgorithm::Aes1,
            auth: AuthTagType::Hs80,
            keyagr: KeyAgreementAlgorithm::Ec25,
            sas: SasType::B32,
        };
        let encoded = ZrtpMessage::Hello(hello).encode();
        let decoded = ZrtpMessage::decode(&encoded).unwrap();
        assert!(matches!(decoded, ZrtpMessage::Hello(_)));
    }

    #[test]
    fn dhpart_round_trips_with_variable_length_pv() {
        let msg = DhPartMessage {
            pv: vec![7u8; 32],
            h1: [9u8; HASH_LEN],
        };
        let encoded = ZrtpMessage::DhPart1(msg).encode();
        match ZrtpMessage::decode(&encoded).unwrap() {
            ZrtpMessage::DhPart1(d) => assert_eq!(d.pv, vec![7u8; 32]),
            other => panic!("wrong variant decoded: {other:?}"),
        }
    }

    #[test]
    fn corrupted_message_fails_crc() {
        let mut encoded = ZrtpMessage::HelloAck.encode();
        let last = encoded.len() - 1;
        encoded[last] ^= 1;
        assert_eq!(ZrtpMessage::decode(&encoded).unwrap_err(), ZrtpError::BadCrc);
    }
}
