use core::convert::Infallible;

use alloy_primitives::{Address, TxKind, B256, U256};
use delegate::delegate;
use revm::{
    context::{BlockEnv, Context, TxEnv},
    context_interface::result::{ExecutionResult, Output},
    handler::{ExecuteCommitEvm, MainBuilder, MainnetContext},
    primitives::{hardfork::SpecId, HashMap, StorageKey, StorageValue},
    state::{Account, AccountInfo, Bytecode},
    Database, DatabaseCommit,
};

use super::{BlockHashCallback, EvmApply, EvmApplyError, EvmParams, EvmResult};
use crate::{intrinsic_gas, StateDb};

/// An [`EvmApply`] backed by `revm`.
///
/// Fees are settled outside of the EVM, so transactions run with a zero gas price and with the
/// base-fee, nonce and block-gas-limit checks disabled. Intrinsic gas is charged before the call
/// reaches the EVM; the backend adds it back to the transaction gas limit and subtracts it from the
/// reported usage.
///
/// The state transition increments the sender nonce of every message before dispatching it. The
/// EVM expects the nonce the message was sent with, both to derive created addresses and to bump
/// it itself, so the backend hands it the nonce from before the increment.
///
/// A sender that cannot pay the transferred value fails the call with an EVM error instead of
/// rejecting the message.
#[derive(Debug, Clone, Copy)]
pub struct RevmBackend {
    spec: SpecId,
}

impl Default for RevmBackend {
    fn default() -> Self {
        Self { spec: SpecId::CANCUN }
    }
}

impl RevmBackend {
    /// Creates a backend executing with the given hardfork rules.
    pub const fn new(spec: SpecId) -> Self {
        Self { spec }
    }
}

impl EvmApply for RevmBackend {
    fn apply(
        &self,
        state: &mut StateDb,
        params: EvmParams<'_>,
    ) -> Result<EvmResult, EvmApplyError> {
        let EvmParams { from, to, value, input, gas, gas_price: _, context } = params;

        let intrinsic = intrinsic_gas(&input, to.is_none());
        let (balance, nonce) =
            state.account(from).map_or((U256::ZERO, 0), |info| (info.balance, info.nonce));
        if balance < value {
            tracing::trace!(%from, %balance, %value, "evm call cannot pay its value");
            return Ok(EvmResult {
                evm_error: Some(format!(
                    "insufficient balance for transfer: have {balance}, want {value}"
                )),
                ..Default::default()
            });
        }
        state.set_nonce(from, nonce.saturating_sub(1));
        let db = BlockHashDb { state: &mut *state, block_hash: context.block_hash };
        let mut ctx: MainnetContext<BlockHashDb<'_>> = Context::new(db, self.spec);

        let mut block = BlockEnv::default();
        block.number = U256::from(context.block_number);
        block.timestamp = U256::from(context.time);
        block.beneficiary = context.coinbase;
        block.gas_limit = context.gas_limit.saturating_to();
        block.basefee = context.base_fee.saturating_to();
        block.difficulty = U256::ZERO;
        block.prevrandao = Some(context.random);
        ctx.block = block;

        ctx.cfg.chain_id = context.chain_id;
        ctx.cfg.disable_base_fee = true;
        ctx.cfg.disable_nonce_check = true;
        ctx.cfg.disable_block_gas_limit = true;

        let tx = TxEnv {
            caller: from,
            gas_limit: gas.saturating_add(intrinsic),
            gas_price: 0,
            kind: to.map_or(TxKind::Create, TxKind::Call),
            value,
            data: input,
            chain_id: Some(context.chain_id),
            ..Default::default()
        };

        let outcome = ctx.build_mainnet().transact_commit(tx);
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                state.set_nonce(from, nonce);
                return Err(EvmApplyError::Rejected(err.to_string()));
            }
        };

        let result = match outcome {
            ExecutionResult::Success { gas_used, output, logs, .. } => {
                let contract_address = output.address().copied();
                let return_data = match output {
                    Output::Call(data) => data,
                    Output::Create(code, _) => code,
                };
                EvmResult {
                    used_gas: gas_used.saturating_sub(intrinsic),
                    return_data,
                    logs,
                    contract_address,
                    ..Default::default()
                }
            }
            ExecutionResult::Revert { gas_used, output } => EvmResult {
                used_gas: gas_used.saturating_sub(intrinsic),
                return_data: output,
                reverted: true,
                ..Default::default()
            },
            ExecutionResult::Halt { reason, gas_used } => EvmResult {
                used_gas: gas_used.saturating_sub(intrinsic),
                evm_error: Some(format!("{reason:?}")),
                ..Default::default()
            },
        };

        // the EVM never reports more than it was given
        let result = EvmResult { used_gas: result.used_gas.min(gas), ..result };
        tracing::trace!(
            used_gas = result.used_gas,
            reverted = result.reverted,
            error = ?result.evm_error,
            "evm call finished"
        );
        Ok(result)
    }
}

/// Routes `BLOCKHASH` lookups of the EVM to the block-hash callback of the current block.
#[derive(Debug)]
struct BlockHashDb<'a> {
    state: &'a mut StateDb,
    block_hash: BlockHashCallback<'a>,
}

impl Database for BlockHashDb<'_> {
    type Error = Infallible;

    delegate! {
        to self.state {
            fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;
            fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;
            fn storage(&mut self, address: Address, index: StorageKey) -> Result<StorageValue, Self::Error>;
        }
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        Ok(self.block_hash.block_hash(number))
    }
}

impl DatabaseCommit for BlockHashDb<'_> {
    delegate! {
        to self.state {
            fn commit(&mut self, changes: HashMap<Address, Account>);
        }
    }
}
