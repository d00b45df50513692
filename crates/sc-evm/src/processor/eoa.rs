use alloy_primitives::Bytes;

use super::{ExecutionContext, MessageProcessor};
use crate::{AccountStateView, ExecutionError, InitializationError, Invocation};

/// Transfers value between externally owned accounts.
///
/// Handles every call to an account that carries neither EVM code nor a native contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct Eoa2EoaMessageProcessor;

impl MessageProcessor for Eoa2EoaMessageProcessor {
    fn name(&self) -> &'static str {
        "eoa2eoa"
    }

    fn init(&self, _view: &mut AccountStateView, _epoch: u32) -> Result<(), InitializationError> {
        Ok(())
    }

    fn can_process(&self, invocation: &Invocation, view: &AccountStateView, _epoch: u32) -> bool {
        invocation.callee.is_some_and(|to| {
            !view.is_smart_contract_account(to) && !view.is_native_contract_account(to)
        })
    }

    fn process(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        _context: &ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError> {
        let Some(to) = invocation.callee else {
            return Err(ExecutionError::invalid("value transfer without a recipient"));
        };
        if invocation.value.is_zero() {
            return Ok(Bytes::new());
        }
        view.sub_balance(invocation.caller, invocation.value).map_err(ExecutionError::failed)?;
        view.add_balance(to, invocation.value);
        Ok(Bytes::new())
    }
}
