use alloy_primitives::{keccak256, B256, U256};

use super::{CrossChainMessageHash, RedemptionStorage};
use crate::{
    constants::native::{CROSS_CHAIN_REDEEM_ADDRESS, CROSS_CHAIN_SEND_ADDRESS},
    AccountStateView,
};

const REDEEMED_PREFIX: &[u8] = b"sc2sc.redeemed";
const COMMITMENT_ROOT_PREFIX: &[u8] = b"sc2sc.commitmentRoot";
const SENT_COUNT_PREFIX: &[u8] = b"sc2sc.sentCount";
const SENT_PREFIX: &[u8] = b"sc2sc.sent";

fn slot(prefix: &[u8], parts: &[&[u8]]) -> U256 {
    let mut preimage = prefix.to_vec();
    for part in parts {
        preimage.extend_from_slice(part);
    }
    U256::from_be_bytes(keccak256(preimage).0)
}

const SET: U256 = U256::from_limbs([1, 0, 0, 0]);

impl AccountStateView {
    /// Records a commitment tree root anchored by an accepted withdrawal certificate.
    pub fn add_commitment_root(&mut self, root: &[u8]) {
        self.set_storage(CROSS_CHAIN_REDEEM_ADDRESS, slot(COMMITMENT_ROOT_PREFIX, &[root]), SET);
    }

    /// Returns the hashes of the messages sent during `withdrawal_epoch`, in sending order.
    pub fn sent_message_hashes(&self, withdrawal_epoch: u32) -> Vec<CrossChainMessageHash> {
        let epoch = withdrawal_epoch.to_be_bytes();
        let count: u64 = self
            .storage_at(CROSS_CHAIN_SEND_ADDRESS, slot(SENT_COUNT_PREFIX, &[&epoch]))
            .saturating_to();
        (0..count)
            .map(|index| {
                let key = slot(SENT_PREFIX, &[&epoch, &index.to_be_bytes()]);
                let value = self.storage_at(CROSS_CHAIN_SEND_ADDRESS, key);
                CrossChainMessageHash(B256::from(value.to_be_bytes::<32>()))
            })
            .collect()
    }

    /// Appends `hash` to the messages sent during `withdrawal_epoch`.
    pub(crate) fn record_sent_message(
        &mut self,
        withdrawal_epoch: u32,
        hash: CrossChainMessageHash,
    ) {
        let epoch = withdrawal_epoch.to_be_bytes();
        let count_key = slot(SENT_COUNT_PREFIX, &[&epoch]);
        let count: u64 = self.storage_at(CROSS_CHAIN_SEND_ADDRESS, count_key).saturating_to();
        self.set_storage(
            CROSS_CHAIN_SEND_ADDRESS,
            slot(SENT_PREFIX, &[&epoch, &count.to_be_bytes()]),
            U256::from_be_slice(hash.as_slice()),
        );
        self.set_storage(CROSS_CHAIN_SEND_ADDRESS, count_key, U256::from(count + 1));
    }
}

impl RedemptionStorage for AccountStateView {
    fn hash_already_redeemed(&self, hash: &CrossChainMessageHash) -> bool {
        let key = slot(REDEEMED_PREFIX, &[hash.as_slice()]);
        !self.storage_at(CROSS_CHAIN_REDEEM_ADDRESS, key).is_zero()
    }

    fn commitment_root_exists(&self, root: &[u8]) -> bool {
        let key = slot(COMMITMENT_ROOT_PREFIX, &[root]);
        !self.storage_at(CROSS_CHAIN_REDEEM_ADDRESS, key).is_zero()
    }

    fn record_redeemed(&mut self, hash: CrossChainMessageHash) {
        let key = slot(REDEEMED_PREFIX, &[hash.as_slice()]);
        self.set_storage(CROSS_CHAIN_REDEEM_ADDRESS, key, SET);
    }
}
