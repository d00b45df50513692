use core::fmt;

use alloy_primitives::{hex, Address, Bytes, B256};
use alloy_rlp::{
    Decodable, Encodable, Header, RlpDecodableWrapper, RlpEncodable, RlpEncodableWrapper,
};
use serde::{Deserialize, Serialize};

use crate::constants::sc2sc::{
    ACCOUNT_ADDRESS_LENGTH, MAX_PAYLOAD_LENGTH, SIDECHAIN_ID_LENGTH, UTXO_ADDRESS_LENGTH,
};

/// Converts a sidechain id between internal and mainchain byte order.
///
/// The conversion is its own inverse.
pub fn to_mainchain_format(sidechain_id: &B256) -> B256 {
    let mut bytes = sidechain_id.0;
    bytes.reverse();
    B256::from(bytes)
}

/// Version of the cross-chain messaging protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CrossChainProtocolVersion {
    /// The first protocol version.
    #[default]
    V1 = 1,
}

impl TryFrom<u8> for CrossChainProtocolVersion {
    type Error = CrossChainMessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::V1),
            other => Err(CrossChainMessageError::UnknownProtocolVersion(other)),
        }
    }
}

impl Encodable for CrossChainProtocolVersion {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        (*self as u8).encode(out);
    }

    fn length(&self) -> usize {
        (*self as u8).length()
    }
}

impl Decodable for CrossChainProtocolVersion {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Self::try_from(u8::decode(buf)?)
            .map_err(|_| alloy_rlp::Error::Custom("unknown cross-chain protocol version"))
    }
}

/// The error returned when a cross-chain message or its redemption envelope is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrossChainMessageError {
    /// The protocol version is not supported.
    #[error("Unknown cross-chain protocol version {0}")]
    UnknownProtocolVersion(u8),
    /// The sender sidechain id is not 32 bytes long.
    #[error("Sender sidechain id must be 32 bytes long")]
    SenderSidechainLength,
    /// The receiver sidechain id is not 32 bytes long.
    #[error("Receiver sidechain id must be 32 bytes long")]
    ReceiverSidechainLength,
    /// The sender address is neither an account nor a UTXO address.
    #[error("Sender address length is not correct")]
    SenderAddressLength,
    /// The receiver address is neither an account nor a UTXO address.
    #[error("Receiver address length is not correct")]
    ReceiverAddressLength,
    /// The payload is empty.
    #[error("Payload cannot be empty")]
    EmptyPayload,
    /// The payload is too large.
    #[error("Payload size {0} exceeds the maximum of {MAX_PAYLOAD_LENGTH} bytes")]
    PayloadTooLarge(usize),
    /// A certificate data hash is not 32 bytes long.
    #[error("Certificate data hash must be 32 bytes long")]
    CertificateDataHashLength,
    /// A commitment tree root is not 32 bytes long.
    #[error("Sidechain commitment tree root must be 32 bytes long")]
    CommitmentTreeRootLength,
    /// The proof is empty.
    #[error("Proof cannot be empty")]
    EmptyProof,
}

/// A message sent from one sidechain to another.
///
/// Instances are always well-formed: the constructor and the decoder check every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, RlpEncodable)]
pub struct CrossChainMessage {
    pub(super) protocol_version: CrossChainProtocolVersion,
    pub(super) message_type: u32,
    pub(super) sender_sidechain: Bytes,
    pub(super) sender: Bytes,
    pub(super) receiver_sidechain: Bytes,
    pub(super) receiver: Bytes,
    pub(super) payload: Bytes,
}

impl CrossChainMessage {
    /// Creates a message, checking every field.
    pub fn new(
        protocol_version: CrossChainProtocolVersion,
        message_type: u32,
        sender_sidechain: Bytes,
        sender: Bytes,
        receiver_sidechain: Bytes,
        receiver: Bytes,
        payload: Bytes,
    ) -> Result<Self, CrossChainMessageError> {
        let message = Self {
            protocol_version,
            message_type,
            sender_sidechain,
            sender,
            receiver_sidechain,
            receiver,
            payload,
        };
        message.validate()?;
        Ok(message)
    }

    /// Decodes a message without checking its fields.
    pub(super) fn decode_fields(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        decode_list(buf, |buf| {
            Ok(Self {
                protocol_version: Decodable::decode(buf)?,
                message_type: Decodable::decode(buf)?,
                sender_sidechain: Decodable::decode(buf)?,
                sender: Decodable::decode(buf)?,
                receiver_sidechain: Decodable::decode(buf)?,
                receiver: Decodable::decode(buf)?,
                payload: Decodable::decode(buf)?,
            })
        })
    }

    /// Checks the length of every field.
    pub fn validate(&self) -> Result<(), CrossChainMessageError> {
        if self.sender_sidechain.len() != SIDECHAIN_ID_LENGTH {
            return Err(CrossChainMessageError::SenderSidechainLength);
        }
        if self.receiver_sidechain.len() != SIDECHAIN_ID_LENGTH {
            return Err(CrossChainMessageError::ReceiverSidechainLength);
        }
        if !is_address_length(self.sender.len()) {
            return Err(CrossChainMessageError::SenderAddressLength);
        }
        if !is_address_length(self.receiver.len()) {
            return Err(CrossChainMessageError::ReceiverAddressLength);
        }
        if self.payload.is_empty() {
            return Err(CrossChainMessageError::EmptyPayload);
        }
        if self.payload.len() > MAX_PAYLOAD_LENGTH {
            return Err(CrossChainMessageError::PayloadTooLarge(self.payload.len()));
        }
        Ok(())
    }

    /// Protocol version.
    pub const fn protocol_version(&self) -> CrossChainProtocolVersion {
        self.protocol_version
    }

    /// Application-defined message type.
    pub const fn message_type(&self) -> u32 {
        self.message_type
    }

    /// Id of the sending sidechain, in mainchain byte order.
    pub const fn sender_sidechain(&self) -> &Bytes {
        &self.sender_sidechain
    }

    /// Address of the sender on the sending sidechain.
    pub const fn sender(&self) -> &Bytes {
        &self.sender
    }

    /// Id of the receiving sidechain, in mainchain byte order.
    pub const fn receiver_sidechain(&self) -> &Bytes {
        &self.receiver_sidechain
    }

    /// Address of the receiver on the receiving sidechain.
    pub const fn receiver(&self) -> &Bytes {
        &self.receiver
    }

    /// Message payload.
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Returns the receiver as an account address, if it is one.
    pub fn receiver_address(&self) -> Option<Address> {
        (self.receiver.len() == ACCOUNT_ADDRESS_LENGTH)
            .then(|| Address::from_slice(&self.receiver))
    }
}

impl Decodable for CrossChainMessage {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let message = Self::decode_fields(buf)?;
        message.validate().map_err(|_| alloy_rlp::Error::Custom("malformed cross-chain message"))?;
        Ok(message)
    }
}

impl fmt::Display for CrossChainMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CrossChainMessage{{protocolVersion={}, messageType={}, senderSidechain={}, sender={}, \
             receiverSidechain={}, receiver={}, payload={}}}",
            self.protocol_version as u8,
            self.message_type,
            hex::encode(&self.sender_sidechain),
            hex::encode(&self.sender),
            hex::encode(&self.receiver_sidechain),
            hex::encode(&self.receiver),
            hex::encode(&self.payload),
        )
    }
}

/// Decodes the items of an RLP list with `fields`, rejecting items left over.
pub(super) fn decode_list<T>(
    buf: &mut &[u8],
    fields: impl FnOnce(&mut &[u8]) -> alloy_rlp::Result<T>,
) -> alloy_rlp::Result<T> {
    let mut payload = Header::decode_bytes(buf, true)?;
    let expected = payload.len();
    let value = fields(&mut payload)?;
    if !payload.is_empty() {
        return Err(alloy_rlp::Error::ListLengthMismatch {
            expected,
            got: expected - payload.len(),
        });
    }
    Ok(value)
}

const fn is_address_length(len: usize) -> bool {
    len == ACCOUNT_ADDRESS_LENGTH || len == UTXO_ADDRESS_LENGTH
}

/// The content hash of a [`CrossChainMessage`], the unit of replay protection.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    RlpEncodableWrapper,
    RlpDecodableWrapper,
    derive_more::From,
    derive_more::Deref,
)]
pub struct CrossChainMessageHash(pub B256);

impl fmt::Display for CrossChainMessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
