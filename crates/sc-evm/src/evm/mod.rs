//! The boundary between the execution core and the EVM interpreter.
//!
//! The core never interprets bytecode itself. It hands the caller, the callee, the input and a gas
//! budget to an [`EvmApply`] implementation together with an [`EvmContext`], and receives an
//! [`EvmResult`] back. The EVM executes directly against the [`StateDb`] of the current
//! account state view.
//!
//! The boundary is a trust edge: the block-hash callback never fails, it returns the zero hash for
//! unknown heights, and the EVM is bound to never report more used gas than it was given.

use alloy_primitives::{Address, Bytes, Log, B256, U256};
use auto_impl::auto_impl;

use crate::{BlockContext, BlockHashProvider, StateDb, TraceOptions};

mod backend;
pub use backend::*;

/// Synchronous lookup of past block hashes, callable any number of times during one execution.
#[derive(Debug, Clone, Copy)]
pub struct BlockHashCallback<'a> {
    provider: &'a dyn BlockHashProvider,
}

impl<'a> BlockHashCallback<'a> {
    /// Wraps a block-hash provider.
    pub const fn new(provider: &'a dyn BlockHashProvider) -> Self {
        Self { provider }
    }

    /// Returns the hash of the block at `height`, or the zero hash if it is unknown.
    pub fn block_hash(&self, height: u64) -> B256 {
        self.provider.block_hash_by_height(height).unwrap_or(B256::ZERO)
    }
}

/// The block environment visible to the EVM.
#[derive(Debug, Clone, Copy)]
pub struct EvmContext<'a> {
    /// Chain id.
    pub chain_id: u64,
    /// Beneficiary of the block.
    pub coinbase: Address,
    /// Gas limit of the block.
    pub gas_limit: U256,
    /// Height of the block.
    pub block_number: u64,
    /// Block timestamp.
    pub time: u64,
    /// Base fee per gas.
    pub base_fee: U256,
    /// Block randomness.
    pub random: B256,
    /// Past block hashes.
    pub block_hash: BlockHashCallback<'a>,
    /// Step-level tracing options.
    pub trace_options: Option<&'a TraceOptions>,
}

impl<'a> EvmContext<'a> {
    /// Derives the EVM environment from a block context.
    pub fn from_block(block: &'a BlockContext) -> Self {
        Self {
            chain_id: block.chain_id,
            coinbase: block.forger_address,
            gas_limit: block.block_gas_limit,
            block_number: block.block_number,
            time: block.timestamp,
            base_fee: block.base_fee,
            random: block.randomness,
            block_hash: BlockHashCallback::new(block.block_hash_provider()),
            trace_options: block.trace_options(),
        }
    }
}

/// The arguments of a single EVM call.
#[derive(Debug, Clone)]
pub struct EvmParams<'a> {
    /// The calling account.
    pub from: Address,
    /// The called account. `None` creates a contract.
    pub to: Option<Address>,
    /// Value transferred with the call.
    pub value: U256,
    /// Input data or initcode.
    pub input: Bytes,
    /// Gas available to the call, intrinsic gas excluded.
    pub gas: u64,
    /// Gas price of the message.
    pub gas_price: U256,
    /// The block environment.
    pub context: EvmContext<'a>,
}

/// What the EVM reports back after a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvmResult {
    /// Gas used by the call, never more than [`EvmParams::gas`].
    pub used_gas: u64,
    /// Returned data. For a contract creation, the deployed code.
    pub return_data: Bytes,
    /// Whether execution ended in an explicit revert.
    pub reverted: bool,
    /// Set when execution halted for any other reason.
    pub evm_error: Option<String>,
    /// Logs emitted by a successful call.
    pub logs: Vec<Log>,
    /// Address of the contract created by the call.
    pub contract_address: Option<Address>,
}

impl EvmResult {
    /// Returns whether execution completed without revert or error.
    pub const fn is_success(&self) -> bool {
        !self.reverted && self.evm_error.is_none()
    }
}

/// The error returned when the EVM refuses to execute a call at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvmApplyError {
    /// The call was rejected before execution started.
    #[error("evm rejected the call: {0}")]
    Rejected(String),
}

/// Executes calls against a [`StateDb`].
#[auto_impl(&, Box, Arc)]
pub trait EvmApply: core::fmt::Debug {
    /// Executes one call, committing its state changes to `state`.
    ///
    /// Reverted and halted executions are reported through [`EvmResult`]. An error is returned
    /// only when the call could not be executed at all.
    fn apply(&self, state: &mut StateDb, params: EvmParams<'_>)
        -> Result<EvmResult, EvmApplyError>;
}
