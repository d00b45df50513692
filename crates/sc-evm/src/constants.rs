//! Constants for the sidechain execution core.
//!
//! It groups the constants by concern as sub-modules.

/// Gas constants charged outside of the EVM.
pub mod gas {
    /// Constants inherited from `revm`, used to price native contract storage access.
    pub use revm::interpreter::gas::{COLD_SLOAD_COST, LOG, LOGDATA, LOGTOPIC, SSTORE_SET};

    /// Intrinsic gas of every message.
    pub const TX_GAS: u64 = 21_000;
    /// Extra intrinsic gas of a contract-creation message.
    pub const TX_CREATE_GAS: u64 = 32_000;
    /// Intrinsic gas per zero byte of input.
    pub const TX_DATA_ZERO_GAS: u64 = 4;
    /// Intrinsic gas per non-zero byte of input.
    pub const TX_DATA_NON_ZERO_GAS: u64 = 16;
    /// Intrinsic gas per 32-byte word of initcode (EIP-3860).
    pub const INITCODE_WORD_GAS: u64 = 2;
}

/// Reserved addresses of the native contracts.
pub mod native {
    use alloy_primitives::{address, Address};

    /// Address of the native contract that redeems cross-chain messages.
    pub const CROSS_CHAIN_REDEEM_ADDRESS: Address =
        address!("0x0000000000000000000044444444444444444444");

    /// Address of the native contract that emits outgoing cross-chain messages.
    pub const CROSS_CHAIN_SEND_ADDRESS: Address =
        address!("0x0000000000000000000055555555555555555555");
}

/// Constants of the sidechain-to-sidechain messaging protocol.
pub mod sc2sc {
    /// Length of a sidechain id.
    pub const SIDECHAIN_ID_LENGTH: usize = 32;
    /// Length of an address on an account-model sidechain.
    pub const ACCOUNT_ADDRESS_LENGTH: usize = 20;
    /// Length of an address on a UTXO-model sidechain.
    pub const UTXO_ADDRESS_LENGTH: usize = 32;
    /// Maximum length of a cross-chain message payload.
    pub const MAX_PAYLOAD_LENGTH: usize = 10_000;
    /// Length of certificate data hashes and commitment tree roots.
    pub const HASH_LENGTH: usize = 32;
}
