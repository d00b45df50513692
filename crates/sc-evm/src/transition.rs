use alloy_primitives::U256;

use crate::{
    intrinsic_gas, processor::ExecutionContext, AccountStateView, BlockContext, ExecutionError,
    ExecutionResult, Invocation, Message, MessageProcessorChain,
};

/// Applies messages of one block to an account state view.
///
/// Messages are applied one at a time; each one observes the effects of the previous ones.
#[derive(Debug)]
pub struct StateTransition<'a> {
    view: &'a mut AccountStateView,
    processors: &'a MessageProcessorChain,
    block: &'a BlockContext,
}

impl<'a> StateTransition<'a> {
    /// Creates a transition applying messages of `block` to `view`.
    pub fn new(
        view: &'a mut AccountStateView,
        processors: &'a MessageProcessorChain,
        block: &'a BlockContext,
    ) -> Self {
        Self { view, processors, block }
    }

    /// Returns the view messages are applied to.
    pub fn view(&self) -> &AccountStateView {
        self.view
    }

    /// Applies `message` and classifies the outcome.
    ///
    /// A failed message keeps its nonce increment and pays for its gas, but every other effect is
    /// reverted. An invalid message leaves the view untouched.
    pub fn transition(&mut self, message: &Message) -> ExecutionResult {
        let Ok(gas_limit) = u64::try_from(message.gas_limit) else {
            return invalid(format!("gas limit {} exceeds 64 bits", message.gas_limit));
        };
        let intrinsic = intrinsic_gas(&message.data, message.is_create());
        if gas_limit < intrinsic {
            return invalid(format!("intrinsic gas too low: have {gas_limit}, want {intrinsic}"));
        }

        let initial = self.view.snapshot();
        self.view.increase_nonce(message.from);
        let charged = self.view.snapshot();

        let mut invocation = Invocation::from_message(message, gas_limit - intrinsic);
        let context = ExecutionContext { block: self.block, message };
        let result = self.processors.process(&mut invocation, self.view, &context);

        let gas_used =
            |invocation: &Invocation| U256::from(gas_limit - invocation.gas_pool.get_gas());
        match result {
            Ok(return_data) => {
                self.view.discard_snapshot(initial);
                ExecutionResult::Succeeded { gas_used: gas_used(&invocation), return_data }
            }
            Err(reason @ ExecutionError::Reverted(_)) => {
                self.view.revert_to_snapshot(charged);
                self.view.discard_snapshot(initial);
                tracing::debug!(from = %message.from, "message reverted");
                ExecutionResult::Failed { gas_used: gas_used(&invocation), reason }
            }
            Err(reason @ ExecutionError::Failed(_)) => {
                self.view.revert_to_snapshot(charged);
                self.view.discard_snapshot(initial);
                invocation.gas_pool.consume_all();
                tracing::debug!(from = %message.from, %reason, "message failed");
                ExecutionResult::Failed { gas_used: gas_used(&invocation), reason }
            }
            Err(reason @ ExecutionError::Invalid(_)) => {
                self.view.revert_to_snapshot(initial);
                tracing::warn!(from = %message.from, %reason, "invalid message");
                ExecutionResult::Invalid { reason }
            }
        }
    }
}

fn invalid(reason: String) -> ExecutionResult {
    tracing::warn!(%reason, "invalid message");
    ExecutionResult::Invalid { reason: ExecutionError::Invalid(reason) }
}
