use core::cell::RefCell;
use std::collections::BTreeMap;

use alloy_consensus::Header;
use alloy_primitives::{Address, B256, U256};
use auto_impl::auto_impl;
use serde::{Deserialize, Serialize};

use crate::EvmResult;

/// Looks up the hash of a past block by its height.
///
/// Implementations must be pure lookups: the EVM may call them any number of times while a single
/// message executes.
#[auto_impl(&, Box, Arc)]
pub trait BlockHashProvider: core::fmt::Debug {
    /// Returns the hash of the block at `height`, or `None` if it is unknown.
    fn block_hash_by_height(&self, height: u64) -> Option<B256>;
}

/// A provider that knows no block hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBlockHashes;

impl BlockHashProvider for NoBlockHashes {
    fn block_hash_by_height(&self, _height: u64) -> Option<B256> {
        None
    }
}

impl BlockHashProvider for BTreeMap<u64, B256> {
    fn block_hash_by_height(&self, height: u64) -> Option<B256> {
        self.get(&height).copied()
    }
}

/// Options for step-level tracing of EVM executions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceOptions {
    /// Capture memory at every step.
    #[serde(default)]
    pub enable_memory: bool,
    /// Skip the stack at every step.
    #[serde(default)]
    pub disable_stack: bool,
    /// Skip storage at every step.
    #[serde(default)]
    pub disable_storage: bool,
    /// Capture return data at every step.
    #[serde(default)]
    pub enable_return_data: bool,
    /// Name of a tracer to use instead of the default struct logger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracer: Option<String>,
}

/// The environment shared by every message of one block.
///
/// Built once before the first transaction of the block is processed and never mutated
/// afterwards, except for the last-EVM-result side channel.
#[derive(Debug)]
pub struct BlockContext {
    /// The forger of the block, credited as coinbase.
    pub forger_address: Address,
    /// Block timestamp in seconds.
    pub timestamp: u64,
    /// Base fee per gas.
    pub base_fee: U256,
    /// Gas limit of the whole block.
    pub block_gas_limit: U256,
    /// Height of the block.
    pub block_number: u64,
    /// Consensus epoch the block belongs to.
    pub consensus_epoch_number: u32,
    /// Withdrawal epoch the block belongs to.
    pub withdrawal_epoch_number: u32,
    /// Chain id used for replay protection.
    pub chain_id: u64,
    /// Beacon randomness of the block.
    pub randomness: B256,
    block_hash_provider: Box<dyn BlockHashProvider>,
    trace_options: Option<TraceOptions>,
    evm_result: RefCell<Option<EvmResult>>,
}

impl BlockContext {
    /// Creates a block context from explicit fields, as done for simulated calls.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        forger_address: Address,
        timestamp: u64,
        base_fee: U256,
        block_gas_limit: U256,
        block_number: u64,
        consensus_epoch_number: u32,
        withdrawal_epoch_number: u32,
        chain_id: u64,
        randomness: B256,
        block_hash_provider: impl BlockHashProvider + 'static,
    ) -> Self {
        Self {
            forger_address,
            timestamp,
            base_fee,
            block_gas_limit,
            block_number,
            consensus_epoch_number,
            withdrawal_epoch_number,
            chain_id,
            randomness,
            block_hash_provider: Box::new(block_hash_provider),
            trace_options: None,
            evm_result: RefCell::new(None),
        }
    }

    /// Creates a block context for applying a finalized block.
    ///
    /// The header's `mix_hash` carries the VRF output of the forger and becomes the block
    /// randomness.
    pub fn from_header(
        header: &Header,
        consensus_epoch_number: u32,
        withdrawal_epoch_number: u32,
        chain_id: u64,
        block_hash_provider: impl BlockHashProvider + 'static,
    ) -> Self {
        Self::new(
            header.beneficiary,
            header.timestamp,
            U256::from(header.base_fee_per_gas.unwrap_or_default()),
            U256::from(header.gas_limit),
            header.number,
            consensus_epoch_number,
            withdrawal_epoch_number,
            chain_id,
            header.mix_hash,
            block_hash_provider,
        )
    }

    /// Enables tracing for every message of the block.
    pub fn with_trace_options(mut self, trace_options: TraceOptions) -> Self {
        self.trace_options = Some(trace_options);
        self
    }

    /// Returns the tracing options, if tracing is enabled.
    pub const fn trace_options(&self) -> Option<&TraceOptions> {
        self.trace_options.as_ref()
    }

    /// Returns the block-hash provider of this block.
    pub fn block_hash_provider(&self) -> &dyn BlockHashProvider {
        self.block_hash_provider.as_ref()
    }

    /// Looks up the hash of the block at `height`, returning the zero hash when it is unknown.
    pub fn block_hash(&self, height: u64) -> B256 {
        self.block_hash_provider.block_hash_by_height(height).unwrap_or(B256::ZERO)
    }

    /// Attaches the result of the last EVM execution.
    pub fn set_evm_result(&self, result: EvmResult) {
        *self.evm_result.borrow_mut() = Some(result);
    }

    /// Detaches the result of the last EVM execution.
    pub fn take_evm_result(&self) -> Option<EvmResult> {
        self.evm_result.borrow_mut().take()
    }
}
