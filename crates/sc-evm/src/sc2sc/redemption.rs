use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use alloy_primitives::{hex, Bytes, B256};
use auto_impl::auto_impl;

use super::{to_mainchain_format, CrossChainMessageHash, CrossChainRedeemMessage, Sc2ScCodecs};

/// Chain-local bookkeeping consulted by the redemption validator.
#[auto_impl(&mut, Box)]
pub trait RedemptionStorage {
    /// Returns whether a message with `hash` was already redeemed.
    fn hash_already_redeemed(&self, hash: &CrossChainMessageHash) -> bool;

    /// Returns whether `root` was anchored by a withdrawal certificate accepted by this chain.
    fn commitment_root_exists(&self, root: &[u8]) -> bool;

    /// Records that the message with `hash` was redeemed.
    fn record_redeemed(&mut self, hash: CrossChainMessageHash);
}

/// Verifies the inclusion proof of a redeemed message.
#[auto_impl(&, Box, Arc)]
pub trait ProofVerifier: core::fmt::Debug {
    /// Returns whether `proof` shows that the message with `message_hash` is committed under
    /// `sc_commitment_tree_root` and `next_sc_commitment_tree_root`.
    fn verify_redeem_proof(
        &self,
        message_hash: &CrossChainMessageHash,
        sc_commitment_tree_root: &[u8],
        next_sc_commitment_tree_root: &[u8],
        proof: &[u8],
        verification_key_path: &Path,
    ) -> bool;
}

/// Why a redeem message was rejected. Every variant rejects the enclosing block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RedemptionError {
    /// The message is addressed to another sidechain.
    #[error(
        "Receiver sidechain id `{}` does not match with this sidechain id `{}`",
        hex::encode(.receiver_sidechain),
        hex::encode(.sidechain_id)
    )]
    WrongDestination {
        /// The receiver sidechain of the message.
        receiver_sidechain: Bytes,
        /// Id of this sidechain, in mainchain byte order.
        sidechain_id: B256,
    },
    /// The message was redeemed before.
    #[error("The message `{0}` has already been redeemed")]
    AlreadyRedeemed(String),
    /// The first commitment tree root was never anchored.
    #[error("Sidechain commitment tree root `{}` does not exist", hex::encode(.0))]
    UnknownCommitmentRoot(Bytes),
    /// The second commitment tree root was never anchored.
    #[error("Next sidechain commitment tree root `{}` does not exist", hex::encode(.0))]
    UnknownNextCommitmentRoot(Bytes),
    /// The inclusion proof does not verify.
    #[error("Cannot verify this cross-chain message: `{0}`")]
    InvalidProof(String),
}

/// Admits redeem messages into blocks.
///
/// The checks run in a fixed order, cheapest first, and stop at the first failure:
///
/// 1. the message is addressed to this sidechain;
/// 2. the message was not redeemed before;
/// 3. the commitment tree root is anchored;
/// 4. the next commitment tree root is anchored;
/// 5. the inclusion proof verifies.
///
/// Sidechain ids carried by messages are in mainchain byte order, so the receiver sidechain is
/// compared with the byte-reversed id of this sidechain.
#[derive(Debug)]
pub struct CrossChainMessageRedemptionValidator<V> {
    sidechain_id: B256,
    verification_key_path: PathBuf,
    verifier: V,
    codecs: Arc<Sc2ScCodecs>,
}

impl<V: ProofVerifier> CrossChainMessageRedemptionValidator<V> {
    /// Creates a validator for the sidechain `sidechain_id`, given in internal byte order.
    pub fn new(
        sidechain_id: B256,
        verification_key_path: PathBuf,
        verifier: V,
        codecs: Arc<Sc2ScCodecs>,
    ) -> Self {
        Self { sidechain_id, verification_key_path, verifier, codecs }
    }

    /// Id of this sidechain, in internal byte order.
    pub const fn sidechain_id(&self) -> B256 {
        self.sidechain_id
    }

    /// Runs every check against `storage` and returns the hash of the redeemed message.
    pub fn validate<S: RedemptionStorage + ?Sized>(
        &self,
        storage: &S,
        redeem: &CrossChainRedeemMessage,
    ) -> Result<CrossChainMessageHash, RedemptionError> {
        let message = redeem.message();

        let sidechain_id = to_mainchain_format(&self.sidechain_id);
        if message.receiver_sidechain().as_ref() != sidechain_id.as_slice() {
            return Err(RedemptionError::WrongDestination {
                receiver_sidechain: message.receiver_sidechain().clone(),
                sidechain_id,
            });
        }

        let hash = self.codecs.message_hash(message);
        if storage.hash_already_redeemed(&hash) {
            return Err(RedemptionError::AlreadyRedeemed(message.to_string()));
        }

        let root = redeem.sc_commitment_tree_root();
        if !storage.commitment_root_exists(root) {
            return Err(RedemptionError::UnknownCommitmentRoot(root.clone()));
        }

        let next_root = redeem.next_sc_commitment_tree_root();
        if !storage.commitment_root_exists(next_root) {
            return Err(RedemptionError::UnknownNextCommitmentRoot(next_root.clone()));
        }

        if !self.verifier.verify_redeem_proof(
            &hash,
            root,
            next_root,
            redeem.proof(),
            &self.verification_key_path,
        ) {
            return Err(RedemptionError::InvalidProof(message.to_string()));
        }

        Ok(hash)
    }

    /// Runs every check and records the message as redeemed in `storage` on success.
    pub fn validate_and_record<S: RedemptionStorage + ?Sized>(
        &self,
        storage: &mut S,
        redeem: &CrossChainRedeemMessage,
    ) -> Result<CrossChainMessageHash, RedemptionError> {
        let hash = self.validate(storage, redeem).inspect_err(|err| {
            tracing::warn!(%err, "cross-chain redeem message rejected");
        })?;
        storage.record_redeemed(hash);
        tracing::debug!(%hash, "cross-chain message redeemed");
        Ok(hash)
    }

    /// Validates every redeem message of a block in order.
    ///
    /// A message redeemed earlier in the same block counts as redeemed. Hashes are recorded in
    /// `storage` only if every message passes; otherwise `storage` is left untouched.
    pub fn validate_block<S: RedemptionStorage + ?Sized>(
        &self,
        storage: &mut S,
        redeems: &[CrossChainRedeemMessage],
    ) -> Result<Vec<CrossChainMessageHash>, RedemptionError> {
        let mut pending = PendingRedemptions { storage: &*storage, pending: HashSet::new() };
        let mut hashes = Vec::with_capacity(redeems.len());
        for redeem in redeems {
            hashes.push(self.validate_and_record(&mut pending, redeem)?);
        }
        for hash in &hashes {
            storage.record_redeemed(*hash);
        }
        Ok(hashes)
    }
}

/// Redemptions accepted earlier in a block, layered over the committed storage.
struct PendingRedemptions<'a, S: ?Sized> {
    storage: &'a S,
    pending: HashSet<CrossChainMessageHash>,
}

impl<S: RedemptionStorage + ?Sized> RedemptionStorage for PendingRedemptions<'_, S> {
    fn hash_already_redeemed(&self, hash: &CrossChainMessageHash) -> bool {
        self.pending.contains(hash) || self.storage.hash_already_redeemed(hash)
    }

    fn commitment_root_exists(&self, root: &[u8]) -> bool {
        self.storage.commitment_root_exists(root)
    }

    fn record_redeemed(&mut self, hash: CrossChainMessageHash) {
        self.pending.insert(hash);
    }
}
