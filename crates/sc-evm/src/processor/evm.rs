use alloy_primitives::Bytes;

use super::{ExecutionContext, MessageProcessor};
use crate::{
    AccountStateView, EvmApply, EvmContext, EvmParams, ExecutionError, InitializationError,
    Invocation,
};

/// Forwards contract creations and calls to smart contracts to the EVM.
#[derive(Debug)]
pub struct EvmMessageProcessor<E> {
    evm: E,
}

impl<E: EvmApply> EvmMessageProcessor<E> {
    /// Creates a processor executing through `evm`.
    pub const fn new(evm: E) -> Self {
        Self { evm }
    }
}

impl<E: EvmApply> MessageProcessor for EvmMessageProcessor<E> {
    fn name(&self) -> &'static str {
        "evm"
    }

    fn init(&self, _view: &mut AccountStateView, _epoch: u32) -> Result<(), InitializationError> {
        Ok(())
    }

    fn can_process(&self, invocation: &Invocation, view: &AccountStateView, _epoch: u32) -> bool {
        invocation.callee.is_none_or(|to| view.is_smart_contract_account(to))
    }

    fn process(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        context: &ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError> {
        let params = EvmParams {
            from: invocation.caller,
            to: invocation.callee,
            value: invocation.value,
            input: invocation.input.clone(),
            gas: invocation.gas_pool.get_gas(),
            gas_price: context.message.gas_price,
            context: EvmContext::from_block(context.block),
        };
        let result =
            self.evm.apply(view.state_db_mut(), params).map_err(ExecutionError::invalid)?;

        invocation.gas_pool.sub_gas(result.used_gas)?;
        if context.block.trace_options().is_some() {
            context.block.set_evm_result(result.clone());
        }

        if result.reverted {
            return Err(ExecutionError::Reverted(result.return_data));
        }
        if let Some(error) = result.evm_error {
            invocation.gas_pool.consume_all();
            return Err(ExecutionError::Failed(error));
        }
        for log in result.logs {
            view.add_log(log);
        }
        Ok(result.return_data)
    }

    fn custom_tracing(&self) -> bool {
        true
    }
}
