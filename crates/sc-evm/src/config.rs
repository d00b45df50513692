use std::path::PathBuf;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// Static configuration of a sidechain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Chain id used for transaction replay protection.
    pub chain_id: u64,
    /// Id of this sidechain, in internal byte order.
    pub sidechain_id: B256,
    /// Sidechain-to-sidechain messaging.
    #[serde(default)]
    pub sc2sc: Sc2ScConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self { chain_id: 1997, sidechain_id: B256::ZERO, sc2sc: Sc2ScConfig::default() }
    }
}

/// Configuration of sidechain-to-sidechain messaging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sc2ScConfig {
    /// Whether contracts may send messages to other sidechains.
    #[serde(default)]
    pub can_send_messages: bool,
    /// Whether messages from other sidechains may be redeemed here.
    #[serde(default)]
    pub can_receive_messages: bool,
    /// Path of the key used to verify redemption proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_key_path: Option<PathBuf>,
}
