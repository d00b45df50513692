use std::{collections::HashSet, path::Path};

use alloy_primitives::{b256, Address, Bytes, B256};

use crate::sc2sc::{
    to_mainchain_format, CrossChainMessage, CrossChainMessageHash, CrossChainProtocolVersion,
    CrossChainRedeemMessage, ProofVerifier, RedemptionStorage,
};

/// Id of the local test sidechain, in internal byte order.
pub const LOCAL_SIDECHAIN_ID: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000aa0102");

/// Id of the remote test sidechain, in internal byte order.
pub const REMOTE_SIDECHAIN_ID: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000bb0304");

/// A commitment tree root anchored by [`InMemoryRedemptionStorage::anchored`].
pub const COMMITMENT_ROOT: [u8; 32] = [0x11; 32];

/// The commitment tree root of the certificate following [`COMMITMENT_ROOT`].
pub const NEXT_COMMITMENT_ROOT: [u8; 32] = [0x22; 32];

/// Creates a message from a remote account to `receiver` on the local sidechain.
pub fn inbound_message(receiver: Address, payload: &[u8]) -> CrossChainMessage {
    message_to(to_mainchain_format(&LOCAL_SIDECHAIN_ID), receiver, payload)
}

/// Creates a message from a remote account to `receiver` on the sidechain `receiver_sidechain`,
/// given in mainchain byte order.
pub fn message_to(
    receiver_sidechain: B256,
    receiver: Address,
    payload: &[u8],
) -> CrossChainMessage {
    CrossChainMessage::new(
        CrossChainProtocolVersion::V1,
        1,
        Bytes::copy_from_slice(to_mainchain_format(&REMOTE_SIDECHAIN_ID).as_slice()),
        Bytes::copy_from_slice(&[0xee; 20]),
        Bytes::copy_from_slice(receiver_sidechain.as_slice()),
        Bytes::copy_from_slice(receiver.as_slice()),
        Bytes::copy_from_slice(payload),
    )
    .unwrap()
}

/// Wraps `message` in a redemption envelope proving it under the given roots.
pub fn redeem_message_with_roots(
    message: CrossChainMessage,
    root: [u8; 32],
    next_root: [u8; 32],
) -> CrossChainRedeemMessage {
    CrossChainRedeemMessage::new(
        message,
        Bytes::copy_from_slice(&[0x33; 32]),
        Bytes::copy_from_slice(&[0x44; 32]),
        Bytes::copy_from_slice(&root),
        Bytes::copy_from_slice(&next_root),
        Bytes::from_static(b"proof"),
    )
    .unwrap()
}

/// Wraps `message` in a redemption envelope proving it under [`COMMITMENT_ROOT`] and
/// [`NEXT_COMMITMENT_ROOT`].
pub fn redeem_message(message: CrossChainMessage) -> CrossChainRedeemMessage {
    redeem_message_with_roots(message, COMMITMENT_ROOT, NEXT_COMMITMENT_ROOT)
}

/// A [`RedemptionStorage`] backed by hash sets.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRedemptionStorage {
    /// Hashes of the redeemed messages.
    pub redeemed: HashSet<CrossChainMessageHash>,
    /// Anchored commitment tree roots.
    pub roots: HashSet<Vec<u8>>,
}

impl InMemoryRedemptionStorage {
    /// Creates a storage in which [`COMMITMENT_ROOT`] and [`NEXT_COMMITMENT_ROOT`] are anchored.
    pub fn anchored() -> Self {
        Self::default().with_root(&COMMITMENT_ROOT).with_root(&NEXT_COMMITMENT_ROOT)
    }

    /// Anchors `root`.
    pub fn with_root(mut self, root: &[u8]) -> Self {
        self.roots.insert(root.to_vec());
        self
    }
}

impl RedemptionStorage for InMemoryRedemptionStorage {
    fn hash_already_redeemed(&self, hash: &CrossChainMessageHash) -> bool {
        self.redeemed.contains(hash)
    }

    fn commitment_root_exists(&self, root: &[u8]) -> bool {
        self.roots.contains(root)
    }

    fn record_redeemed(&mut self, hash: CrossChainMessageHash) {
        self.redeemed.insert(hash);
    }
}

/// A [`ProofVerifier`] with a fixed verdict.
#[derive(Debug, Clone, Copy)]
pub struct StaticProofVerifier(pub bool);

impl ProofVerifier for StaticProofVerifier {
    fn verify_redeem_proof(
        &self,
        _message_hash: &CrossChainMessageHash,
        _sc_commitment_tree_root: &[u8],
        _next_sc_commitment_tree_root: &[u8],
        _proof: &[u8],
        _verification_key_path: &Path,
    ) -> bool {
        self.0
    }
}
