//! Wire codecs of the cross-chain types.
//!
//! Codecs are plain values bundled in [`Sc2ScCodecs`], built once and handed to every component
//! that encodes, decodes or hashes cross-chain data.

use core::{fmt::Debug, marker::PhantomData};

use alloy_primitives::keccak256;
use alloy_rlp::Encodable;

use super::{
    CrossChainMessage, CrossChainMessageError, CrossChainMessageHash, CrossChainRedeemMessage,
};

/// The error returned when bytes cannot be decoded into a well-formed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The bytes are not valid RLP for the expected type.
    #[error("rlp decoding failed: {0}")]
    Rlp(alloy_rlp::Error),
    /// The value was followed by unexpected bytes.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),
    /// The decoded value is malformed.
    #[error(transparent)]
    Malformed(#[from] CrossChainMessageError),
}

impl From<alloy_rlp::Error> for CodecError {
    fn from(err: alloy_rlp::Error) -> Self {
        Self::Rlp(err)
    }
}

/// Encodes and decodes one wire type.
pub trait WireCodec<T>: Debug + Send + Sync {
    /// Serializes `value`.
    fn encode(&self, value: &T) -> Vec<u8>;

    /// Deserializes a value, rejecting malformed or trailing data.
    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// Field decoding and checks of an RLP wire type, kept apart so that a malformed value reports
/// which field is wrong.
pub trait WireCheck: Sized {
    /// Decodes the RLP fields without checking them.
    fn decode_unchecked(buf: &mut &[u8]) -> alloy_rlp::Result<Self>;

    /// Returns an error if the value is malformed.
    fn check(&self) -> Result<(), CrossChainMessageError>;
}

impl WireCheck for CrossChainMessage {
    fn decode_unchecked(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Self::decode_fields(buf)
    }

    fn check(&self) -> Result<(), CrossChainMessageError> {
        self.validate()
    }
}

impl WireCheck for CrossChainRedeemMessage {
    fn decode_unchecked(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        Self::decode_fields(buf)
    }

    fn check(&self) -> Result<(), CrossChainMessageError> {
        self.validate()
    }
}

/// RLP encoding of a wire type.
#[derive(Debug)]
pub struct RlpCodec<T>(PhantomData<fn() -> T>);

impl<T> Default for RlpCodec<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: Debug + Encodable + WireCheck> WireCodec<T> for RlpCodec<T> {
    fn encode(&self, value: &T) -> Vec<u8> {
        alloy_rlp::encode(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let mut buf = bytes;
        let value = T::decode_unchecked(&mut buf)?;
        if !buf.is_empty() {
            return Err(CodecError::TrailingBytes(buf.len()));
        }
        value.check()?;
        Ok(value)
    }
}

/// Hashes the encoding of a [`CrossChainMessage`] into its content hash.
pub trait MessageHasher: Debug + Send + Sync {
    /// Returns the hash of `encoded`.
    fn hash(&self, encoded: &[u8]) -> CrossChainMessageHash;
}

/// Keccak-256 over the message encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct Keccak256Hasher;

impl MessageHasher for Keccak256Hasher {
    fn hash(&self, encoded: &[u8]) -> CrossChainMessageHash {
        CrossChainMessageHash(keccak256(encoded))
    }
}

/// The codecs of every cross-chain wire type.
#[derive(Debug)]
pub struct Sc2ScCodecs {
    /// Codec of [`CrossChainMessage`].
    pub message: Box<dyn WireCodec<CrossChainMessage>>,
    /// Codec of [`CrossChainRedeemMessage`].
    pub redeem_message: Box<dyn WireCodec<CrossChainRedeemMessage>>,
    /// Hash of a [`CrossChainMessage`], computed over its `message` encoding.
    pub message_hasher: Box<dyn MessageHasher>,
}

impl Sc2ScCodecs {
    /// Creates the RLP codecs with Keccak-256 message hashes.
    pub fn rlp() -> Self {
        Self {
            message: Box::new(RlpCodec::<CrossChainMessage>::default()),
            redeem_message: Box::new(RlpCodec::<CrossChainRedeemMessage>::default()),
            message_hasher: Box::new(Keccak256Hasher),
        }
    }

    /// Computes the content hash of `message` over its full encoding.
    pub fn message_hash(&self, message: &CrossChainMessage) -> CrossChainMessageHash {
        self.message_hasher.hash(&self.message.encode(message))
    }
}

impl Default for Sc2ScCodecs {
    fn default() -> Self {
        Self::rlp()
    }
}
