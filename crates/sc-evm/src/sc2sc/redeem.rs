use alloy_primitives::Bytes;
use alloy_rlp::{Decodable, RlpEncodable};

use super::{message::decode_list, CrossChainMessage, CrossChainMessageError};
use crate::constants::sc2sc::HASH_LENGTH;

/// A [`CrossChainMessage`] together with the material proving that it was committed on the
/// sending sidechain.
///
/// The message must be included in a commitment tree whose root is anchored by two consecutive
/// withdrawal certificates. Like the message itself, instances are always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable)]
pub struct CrossChainRedeemMessage {
    pub(super) message: CrossChainMessage,
    pub(super) certificate_data_hash: Bytes,
    pub(super) next_certificate_data_hash: Bytes,
    pub(super) sc_commitment_tree_root: Bytes,
    pub(super) next_sc_commitment_tree_root: Bytes,
    pub(super) proof: Bytes,
}

impl CrossChainRedeemMessage {
    /// Creates a redemption envelope, checking every field.
    pub fn new(
        message: CrossChainMessage,
        certificate_data_hash: Bytes,
        next_certificate_data_hash: Bytes,
        sc_commitment_tree_root: Bytes,
        next_sc_commitment_tree_root: Bytes,
        proof: Bytes,
    ) -> Result<Self, CrossChainMessageError> {
        let redeem = Self {
            message,
            certificate_data_hash,
            next_certificate_data_hash,
            sc_commitment_tree_root,
            next_sc_commitment_tree_root,
            proof,
        };
        redeem.validate()?;
        Ok(redeem)
    }

    /// Decodes an envelope without checking its fields or those of its message.
    pub(super) fn decode_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        decode_list(buf, |buf| {
            Ok(Self {
                message: CrossChainMessage::decode_fields(buf)?,
                certificate_data_hash: Decodable::decode(buf)?,
                next_certificate_data_hash: Decodable::decode(buf)?,
                sc_commitment_tree_root: Decodable::decode(buf)?,
                next_sc_commitment_tree_root: Decodable::decode(buf)?,
                proof: Decodable::decode(buf)?,
            })
        })
    }

    /// Checks the wrapped message and the length of every field.
    pub fn validate(&self) -> Result<(), CrossChainMessageError> {
        self.message.validate()?;
        if self.certificate_data_hash.len() != HASH_LENGTH
            || self.next_certificate_data_hash.len() != HASH_LENGTH
        {
            return Err(CrossChainMessageError::CertificateDataHashLength);
        }
        if self.sc_commitment_tree_root.len() != HASH_LENGTH
            || self.next_sc_commitment_tree_root.len() != HASH_LENGTH
        {
            return Err(CrossChainMessageError::CommitmentTreeRootLength);
        }
        if self.proof.is_empty() {
            return Err(CrossChainMessageError::EmptyProof);
        }
        Ok(())
    }

    /// The redeemed message.
    pub const fn message(&self) -> &CrossChainMessage {
        &self.message
    }

    /// Hash of the certificate data of the epoch the message was sent in.
    pub const fn certificate_data_hash(&self) -> &Bytes {
        &self.certificate_data_hash
    }

    /// Hash of the certificate data of the following epoch.
    pub const fn next_certificate_data_hash(&self) -> &Bytes {
        &self.next_certificate_data_hash
    }

    /// Commitment tree root anchored by the first certificate.
    pub const fn sc_commitment_tree_root(&self) -> &Bytes {
        &self.sc_commitment_tree_root
    }

    /// Commitment tree root anchored by the following certificate.
    pub const fn next_sc_commitment_tree_root(&self) -> &Bytes {
        &self.next_sc_commitment_tree_root
    }

    /// Inclusion proof.
    pub const fn proof(&self) -> &Bytes {
        &self.proof
    }
}

impl Decodable for CrossChainRedeemMessage {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let redeem = Self::decode_fields(buf)?;
        redeem
            .validate()
            .map_err(|_| alloy_rlp::Error::Custom("malformed cross-chain redeem message"))?;
        Ok(redeem)
    }
}
