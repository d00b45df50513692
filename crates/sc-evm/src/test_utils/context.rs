use alloy_primitives::{address, Address, B256, U256};

use crate::{BlockContext, ChainConfig, NoBlockHashes, Sc2ScConfig};

/// An externally owned account with funds in [`funded_view`](crate::test_utils::funded_view).
pub const ALICE: Address = address!("0x0000000000000000000000000000000000100000");

/// A second externally owned account.
pub const BOB: Address = address!("0x0000000000000000000000000000000000100001");

/// The forger credited as coinbase by [`block_context`].
pub const FORGER: Address = address!("0x00000000000000000000000000000000000f0f0f");

/// Chain id used by the test helpers.
pub const TEST_CHAIN_ID: u64 = 1997;

/// Creates the context of block `1`, in consensus and withdrawal epoch `0`.
pub fn block_context() -> BlockContext {
    block_context_at(1, 0)
}

/// Creates the context of block `number`, in consensus epoch `0`.
pub fn block_context_at(number: u64, withdrawal_epoch_number: u32) -> BlockContext {
    BlockContext::new(
        FORGER,
        1_700_000_000 + number * 12,
        U256::from(1_000_000_000u64),
        U256::from(30_000_000u64),
        number,
        0,
        withdrawal_epoch_number,
        TEST_CHAIN_ID,
        B256::repeat_byte(0x42),
        NoBlockHashes,
    )
}

/// Creates the configuration of the local test sidechain.
pub fn chain_config(can_send_messages: bool, can_receive_messages: bool) -> ChainConfig {
    ChainConfig {
        chain_id: TEST_CHAIN_ID,
        sidechain_id: crate::test_utils::LOCAL_SIDECHAIN_ID,
        sc2sc: Sc2ScConfig {
            can_send_messages,
            can_receive_messages,
            verification_key_path: Some("/tmp/sc2sc.vk".into()),
        },
    }
}
