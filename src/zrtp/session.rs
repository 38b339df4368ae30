//! The five-phase ZRTP state machine (RFC 6189 §4), driven by explicit
//! method calls rather than directly owning socket I/O — callers (tests
//! here, a future `MediaStream` worker) feed inbound messages and send
//! whatever outbound message each method returns.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey};

use crate::srtp::SrtpEndpointKeys;
use crate::zrtp::algorithms::{
    AuthTagType, CipherAlgorithm, HashAlgorithm, KeyAgreementAlgorithm, SasType,
};
use crate::zrtp::hash_chain::{sha256, verify_link, HashChain};
use crate::zrtp::messages::{
    CommitMessage, ConfirmMessage, DhPartMessage, HelloMessage, ZrtpMessage, ZID_LEN,
};
use crate::zrtp::zrtp_error::ZrtpError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZrtpRole {
    Initiator,
    Responder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZrtpState {
    Idle,
    Discovery,
    CommitExchanged,
    DhExchanged,
    Confirmed,
    Secure,
    Error,
}

/// Decides the simultaneous-commit race (RFC 6189 §5.1.5): lower `hvi`
/// wins responder status; ties break on lower ZID.
pub fn wins_as_responder(
    my_hvi: &[u8; 32],
    my_zid: &[u8; ZID_LEN],
    their_hvi: &[u8; 32],
    their_zid: &[u8; ZID_LEN],
) -> bool {
    match my_hvi.cmp(their_hvi) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => my_zid < their_zid,
    }
}

pub struct ZrtpSession {
    pub zid: [u8; ZID_LEN],
    pub role: Option<ZrtpRole>,
    pub state: ZrtpState,

    hash_chain: HashChain,
    dh_secret: Option<EphemeralSecret>,
    dh_public: PublicKey,

    peer_zid: Option<[u8; ZID_LEN]>,
    peer_h3: Option<[u8; 32]>,
    peer_h1: Option<[u8; 32]>,

    /// Our own DHPart2, built eagerly so its hash can be committed to in
    /// Commit's `hvi` before the responder has seen it.
    own_dhpart2: DhPartMessage,
    hvi: [u8; 32],

    s0: Option<[u8; 32]>,
}

impl ZrtpSession {
    pub fn new(zid: [u8; ZID_LEN]) -> Self {
        let hash_chain = HashChain::generate();
        let dh_secret = EphemeralSecret::random_from_rng(rand::rngs::OsRng);
        let dh_public = PublicKey::from(&dh_secret);

        let own_dhpart2 = DhPartMessage {
            pv: dh_public.as_bytes().to_vec(),
            h1: hash_chain.h1,
        };
        let hvi = sha256(&ZrtpMessage::DhPart2(own_dhpart2.clone()).encode());

        Self {
            zid,
            role: None,
            state: ZrtpState::Idle,
            hash_chain,
            dh_secret: Some(dh_secret),
            dh_public,
            peer_zid: None,
            peer_h3: None,
            peer_h1: None,
            own_dhpart2,
            hvi,
            s0: None,
        }
    }

    pub fn hello(&mut self) -> ZrtpMessage {
        self.state = ZrtpState::Discovery;
        ZrtpMessage::Hello(HelloMessage {
            zid: self.zid,
            h3: self.hash_chain.h3,
            hash: HashAlgorithm::S256,
            cipher: CipherAlgorithm::Aes1,
            auth: AuthTagType::Hs80,
            keyagr: KeyAgreementAlgorithm::Ec25,
            sas: SasType::B32,
        })
    }

    pub fn on_hello(&mut self, hello: &HelloMessage) -> ZrtpMessage {
        self.peer_zid = Some(hello.zid);
        self.peer_h3 = Some(hello.h3);
        self.state = ZrtpState::Discovery;
        ZrtpMessage::HelloAck
    }

    /// Initiator side: builds Commit once Hello/HelloACK has completed.
    pub fn build_commit(&mut self) -> ZrtpMessage {
        self.role = Some(ZrtpRole::Initiator);
        self.state = ZrtpState::CommitExchanged;
        ZrtpMessage::Commit(CommitMessage {
            zid: self.zid,
            hash: HashAlgorithm::S256,
            cipher: CipherAlgorithm::Aes1,
            auth: AuthTagType::Hs80,
            keyagr: KeyAgreementAlgorithm::Ec25,
            sas: SasType::B32,
            hvi: self.hvi,
        })
    }

    /// Responder side: accepts a Commit, becoming the responder.
    pub fn on_commit(&mut self, commit: &CommitMessage) -> ZrtpMessage {
        self.role = Some(ZrtpRole::Responder);
        self.peer_zid = Some(commit.zid);
        self.state = ZrtpState::CommitExchanged;
        ZrtpMessage::DhPart1(DhPartMessage {
            pv: self.dh_public.as_bytes().to_vec(),
            h1: self.hash_chain.h1,
        })
    }

    /// Initiator side: consumes the responder's DHPart1, replies DHPart2,
    /// and derives `s0`.
    pub fn on_dhpart1(&mut self, dhpart1: &DhPartMessage) -> Result<ZrtpMessage, ZrtpError> {
        self.peer_h1 = Some(dhpart1.h1);
        let peer_zid = self.peer_zid.ok_or(ZrtpError::UnexpectedMessage)?;
        self.derive_s0(&dhpart1.pv, self.zid, peer_zid)?;
        self.state = ZrtpState::DhExchanged;
        Ok(ZrtpMessage::DhPart2(self.own_dhpart2.clone()))
    }

    /// Responder side: consumes the initiator's DHPart2 and derives `s0`.
    pub fn on_dhpart2(&mut self, dhpart2: &DhPartMessage) -> Result<(), ZrtpError> {
        self.peer_h1 = Some(dhpart2.h1);
        let peer_zid = self.peer_zid.ok_or(ZrtpError::UnexpectedMessage)?;
        self.derive_s0(&dhpart2.pv, peer_zid, self.zid)?;
        self.state = ZrtpState::DhExchanged;
        Ok(())
    }

    fn derive_s0(
        &mut self,
        peer_pv: &[u8],
        initiator_zid: [u8; ZID_LEN],
        responder_zid: [u8; ZID_LEN],
    ) -> Result<(), ZrtpError> {
        let secret = self.dh_secret.take().ok_or(ZrtpError::UnexpectedMessage)?;
        let peer_pv: [u8; 32] = peer_pv.try_into().map_err(|_| ZrtpError::TooShort)?;
        let peer_public = PublicKey::from(peer_pv);
        let shared = secret.diffie_hellman(&peer_public);

        let mut mac = HmacSha256::new_from_slice(shared.as_bytes())
            .expect("hmac accepts any key length");
        mac.update(&self.hvi);
        mac.update(&initiator_zid);
        mac.update(&responder_zid);
        let s0: [u8; 32] = mac.finalize().into_bytes().into();
        self.s0 = Some(s0);
        Ok(())
    }

    fn confirm_mac(&self, role: ZrtpRole) -> [u8; 8] {
        let s0 = self.s0.expect("s0 derived before confirm");
        let label: &[u8] = match role {
            ZrtpRole::Initiator => b"Initiator",
            ZrtpRole::Responder => b"Responder",
        };
        let mut mac = HmacSha256::new_from_slice(&s0).expect("hmac accepts any key length");
        mac.update(label);
        mac.update(&self.hash_chain.h0);
        let full = mac.finalize().into_bytes();
        let mut out = [0u8; 8];
        out.copy_from_slice(&full[..8]);
        out
    }

    /// Responder side: builds Confirm1 after DHPart2.
    pub fn build_confirm1(&mut self) -> ZrtpMessage {
        let mac = self.confirm_mac(ZrtpRole::Responder);
        ZrtpMessage::Confirm1(ConfirmMessage {
            h0: self.hash_chain.h0,
            mac,
        })
    }

    /// Initiator side: verifies Confirm1 and replies Confirm2.
    pub fn on_confirm1(&mut self, confirm: &ConfirmMessage) -> Result<ZrtpMessage, ZrtpError> {
        self.verify_confirm(confirm, ZrtpRole::Responder)?;
        self.state = ZrtpState::Confirmed;
        let mac = self.confirm_mac(ZrtpRole::Initiator);
        Ok(ZrtpMessage::Confirm2(ConfirmMessage {
            h0: self.hash_chain.h0,
            mac,
        }))
    }

    /// Responder side: verifies Confirm2 and replies Conf2ACK.
    pub fn on_confirm2(&mut self, confirm: &ConfirmMessage) -> Result<ZrtpMessage, ZrtpError> {
        self.verify_confirm(confirm, ZrtpRole::Initiator)?;
        self.state = ZrtpState::Secure;
        Ok(ZrtpMessage::Conf2Ack)
    }

    /// Initiator side: Conf2ACK is terminal; the session is secure.
    pub fn on_conf2ack(&mut self) {
        self.state = ZrtpState::Secure;
    }

    fn verify_confirm(&self, confirm: &ConfirmMessage, sender: ZrtpRole) -> Result<(), ZrtpError> {
        let peer_h1 = self.peer_h1.ok_or(ZrtpError::UnexpectedMessage)?;
        if !verify_link(&peer_h1, &confirm.h0) {
            return Err(ZrtpError::MacMismatch);
        }
        let s0 = self.s0.ok_or(ZrtpError::UnexpectedMessage)?;
        let label: &[u8] = match sender {
            ZrtpRole::Initiator => b"Initiator",
            ZrtpRole::Responder => b"Responder",
        };
        let mut mac = HmacSha256::new_from_slice(&s0).expect("hmac accepts any key length");
        mac.update(label);
        mac.update(&confirm.h0);
        let full = mac.finalize().into_bytes();
        if full[..8] != confirm.mac {
            return Err(ZrtpError::MacMismatch);
        }
        Ok(())
    }

    pub fn is_secure(&self) -> bool {
        self.state == ZrtpState::Secure
    }

    /// Exports the directional SRTP master key/salt pairs once Confirm has
    /// completed. The initiator's `outbound` matches the responder's
    /// `inbound` and vice versa.
    pub fn export_srtp_keys(&self) -> Result<(SrtpEndpointKeys, SrtpEndpointKeys), ZrtpError> {
        let s0 = self.s0.ok_or(ZrtpError::UnexpectedMessage)?;
        let initiator_to_responder = derive_direction_keys(&s0, b"Initiator SRTP master key");
        let responder_to_initiator = derive_direction_keys(&s0, b"Responder SRTP master key");
        match self.role {
            Some(ZrtpRole::Initiator) => Ok((initiator_to_responder, responder_to_initiator)),
            Some(ZrtpRole::Responder) => Ok((responder_to_initiator, initiator_to_responder)),
            None => Err(ZrtpError::UnexpectedMessage),
        }
    }
}

fn derive_direction_keys(s0: &[u8; 32], label: &[u8]) -> SrtpEndpointKeys {
    let mut key_mac = HmacSha256::new_from_slice(s0).expect("hmac accepts any key length");
    key_mac.update(label);
    key_mac.update(b"key");
    let key_digest = key_mac.finalize().into_bytes();

    let mut salt_mac = HmacSha256::new_from_slice(s0).expect("hmac accepts any key length");
    salt_mac.update(label);
    salt_mac.update(b"salt");
    let salt_digest = salt_mac.finalize().into_bytes();

    SrtpEndpointKeys {
        master_key: key_digest[..16].to_vec(),
        master_salt: salt_digest[..14].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zid(byte: u8) -> [u8; ZID_LEN] {
        [byte; ZID_LEN]
    }

    fn run_handshake() -> (ZrtpSession, ZrtpSession) {
        let mut initiator = ZrtpSession::new(zid(1));
        let mut responder = ZrtpSession::new(zid(2));

        let hello_i = initiator.hello();
        let hello_r = responder.hello();
        let ZrtpMessage::Hello(hello_i) = hello_i else { unreachable!() };
        let ZrtpMessage::Hello(hello_r) = hello_r else { unreachable!() };
        responder.on_hello(&hello_i);
        initiator.on_hello(&hello_r);

        let commit = initiator.build_commit();
        let ZrtpMessage::Commit(commit) = commit else { unreachable!() };
        let dhpart1 = responder.on_commit(&commit);
        let ZrtpMessage::DhPart1(dhpart1) = dhpart1 else { unreachable!() };

        let dhpart2 = initiator.on_dhpart1(&dhpart1).unwrap();
        let ZrtpMessage::DhPart2(dhpart2) = dhpart2 else { unreachable!() };
        responder.on_dhpart2(&dhpart2).unwrap();

        let confirm1 = responder.build_confirm1();
        let ZrtpMessage::Confirm1(confirm1) = confirm1 else { unreachable!() };
        let confirm2 = initiator.on_confirm1(&confirm1).unwrap();
        let ZrtpMessage::Confirm2(confirm2) = confirm2 else { unreachable!() };
        let conf2ack = responder.on_confirm2(&confirm2).unwrap();
        assert!(matches!(conf2ack, ZrtpMessage::Conf2Ack));
        initiator.on_conf2ack();

        (initiator, responder)
    }

    #[test]
    fn full_handshake_reaches_secure_state_on_both_sides() {
        let (initiator, responder) = run_handshake();
        assert!(initiator.is_secure());
        assert!(responder.is_secure());
    }

    #[test]
    fn both_sides_derive_matching_srtp_keys() {
        let (initiator, responder) = run_handshake();
        let (i_out, i_in) = initiator.export_srtp_keys().unwrap();
        let (r_out, r_in) = responder.export_srtp_keys().unwrap();
        assert_eq!(i_out.master_key, r_in.master_key);
        assert_eq!(i_out.master_salt, r_in.master_salt);
        assert_eq!(i_in.master_key, r_out.master_key);
        assert_eq!(i_in.master_salt, r_out.master_salt);
    }

    #[test]
    fn tampered_confirm_mac_is_rejected() {
        let mut initiator = ZrtpSession::new(zid(1));
        let mut responder = ZrtpSession::new(zid(2));
        let ZrtpMessage::Hello(hello_i) = initiator.hello() else { unreachable!() };
        let ZrtpMessage::Hello(hello_r) = responder.hello() else { unreachable!() };
        responder.on_hello(&hello_i);
        initiator.on_hello(&hello_r);
        let ZrtpMessage::Commit(commit) = initiator.build_commit() else { unreachable!() };
        let ZrtpMessage::DhPart1(dhpart1) = responder.on_commit(&commit) else { unreachable!() };
        let ZrtpMessage::DhPart2(dhpart2) = initiator.on_dhpart1(&dhpart1).unwrap() else { unreachable!() };
        responder.on_dhpart2(&dhpart2).unwrap();
        let ZrtpMessage::Confirm1(mut confirm1) = responder.build_confirm1() else { unreachable!() };
        confirm1.mac[0] ^= 0xFF;
        assert_eq!(
            initiator.on_confirm1(&confirm1).unwrap_err(),
            ZrtpError::MacMismatch
        );
    }
}
