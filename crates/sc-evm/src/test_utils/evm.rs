use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, U256};

use crate::{AccountStateView, EvmApply, EvmApplyError, EvmParams, EvmResult, StateDb};

/// Creates a view in which [`ALICE`](crate::test_utils::ALICE) holds `balance`.
pub fn funded_view(balance: U256) -> AccountStateView {
    let mut db = StateDb::new();
    db.set_balance(crate::test_utils::ALICE, balance);
    AccountStateView::new(db)
}

/// A call received by a [`MockEvm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockEvmCall {
    /// The caller.
    pub from: Address,
    /// The callee.
    pub to: Option<Address>,
    /// The value sent.
    pub value: U256,
    /// The input data.
    pub input: Bytes,
    /// The gas made available to the call.
    pub gas: u64,
    /// The block number seen by the call.
    pub block_number: u64,
}

/// An [`EvmApply`] that answers every call with a preset outcome and records the calls it gets.
#[derive(Debug)]
pub struct MockEvm {
    outcome: Result<EvmResult, EvmApplyError>,
    calls: Mutex<Vec<MockEvmCall>>,
}

impl Default for MockEvm {
    fn default() -> Self {
        Self::returning(EvmResult::default())
    }
}

impl MockEvm {
    /// Answers every call with `result`.
    pub fn returning(result: EvmResult) -> Self {
        Self { outcome: Ok(result), calls: Mutex::default() }
    }

    /// Completes every call with `output`, using `used_gas`.
    pub fn succeeding(used_gas: u64, output: impl Into<Bytes>) -> Self {
        Self::returning(EvmResult { used_gas, return_data: output.into(), ..Default::default() })
    }

    /// Reverts every call with `output`, using `used_gas`.
    pub fn reverting(used_gas: u64, output: impl Into<Bytes>) -> Self {
        Self::returning(EvmResult {
            used_gas,
            return_data: output.into(),
            reverted: true,
            ..Default::default()
        })
    }

    /// Halts every call with `error`, using `used_gas`.
    pub fn halting(used_gas: u64, error: &str) -> Self {
        Self::returning(EvmResult {
            used_gas,
            evm_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// Refuses to execute any call.
    pub fn rejecting(reason: &str) -> Self {
        Self {
            outcome: Err(EvmApplyError::Rejected(reason.to_string())),
            calls: Mutex::default(),
        }
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> Vec<MockEvmCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl EvmApply for MockEvm {
    fn apply(
        &self,
        _state: &mut StateDb,
        params: EvmParams<'_>,
    ) -> Result<EvmResult, EvmApplyError> {
        self.calls.lock().unwrap().push(MockEvmCall {
            from: params.from,
            to: params.to,
            value: params.value,
            input: params.input,
            gas: params.gas,
            block_number: params.context.block_number,
        });
        self.outcome.clone()
    }
}
