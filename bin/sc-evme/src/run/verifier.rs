use std::path::Path;

use sc_evm::sc2sc::{CrossChainMessageHash, ProofVerifier};

/// A [`ProofVerifier`] for environments without a proving backend. Rejects every proof.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableVerifier;

impl ProofVerifier for UnavailableVerifier {
    fn verify_redeem_proof(
        &self,
        message_hash: &CrossChainMessageHash,
        _sc_commitment_tree_root: &[u8],
        _next_sc_commitment_tree_root: &[u8],
        _proof: &[u8],
        verification_key_path: &Path,
    ) -> bool {
        tracing::warn!(
            %message_hash,
            verification_key = %verification_key_path.display(),
            "no proof verifier available, rejecting redemption"
        );
        false
    }
}
