use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::GasPool;

/// A state-changing call extracted from a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Sender of the call.
    pub from: Address,
    /// Recipient of the call. `None` creates a contract.
    pub to: Option<Address>,
    /// Legacy gas price.
    pub gas_price: U256,
    /// Maximum fee per gas.
    pub gas_fee_cap: U256,
    /// Maximum priority fee per gas.
    pub gas_tip_cap: U256,
    /// Gas limit of the call, intrinsic gas included.
    pub gas_limit: U256,
    /// Value transferred with the call.
    pub value: U256,
    /// Nonce of the sender.
    pub nonce: U256,
    /// Input data.
    pub data: Bytes,
    /// Set for simulated calls such as gas estimation.
    #[serde(default)]
    pub is_fake: bool,
}

impl Message {
    /// Creates a plain call message with zero fees.
    pub fn call(from: Address, to: Address, value: U256, gas_limit: u64, data: Bytes) -> Self {
        Self::new(from, Some(to), value, gas_limit, data)
    }

    /// Creates a contract-creation message with zero fees.
    pub fn create(from: Address, value: U256, gas_limit: u64, init_code: Bytes) -> Self {
        Self::new(from, None, value, gas_limit, init_code)
    }

    fn new(from: Address, to: Option<Address>, value: U256, gas_limit: u64, data: Bytes) -> Self {
        Self {
            from,
            to,
            gas_price: U256::ZERO,
            gas_fee_cap: U256::ZERO,
            gas_tip_cap: U256::ZERO,
            gas_limit: U256::from(gas_limit),
            value,
            nonce: U256::ZERO,
            data,
            is_fake: false,
        }
    }

    /// Sets the nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = U256::from(nonce);
        self
    }

    /// Sets the gas price and both fee caps to `gas_price`.
    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self.gas_fee_cap = gas_price;
        self.gas_tip_cap = gas_price;
        self
    }

    /// Returns whether the message creates a contract.
    pub const fn is_create(&self) -> bool {
        self.to.is_none()
    }
}

/// A single call handed to a message processor, together with its gas budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The account executing the call.
    pub caller: Address,
    /// The called account. `None` creates a contract.
    pub callee: Option<Address>,
    /// Value transferred with the call.
    pub value: U256,
    /// Input data.
    pub input: Bytes,
    /// Gas left for the call.
    pub gas_pool: GasPool,
    /// Whether the call must not modify state.
    pub read_only: bool,
}

impl Invocation {
    /// Creates the top-level invocation of `message` with `gas` available after intrinsic gas.
    pub fn from_message(message: &Message, gas: u64) -> Self {
        Self {
            caller: message.from,
            callee: message.to,
            value: message.value,
            input: message.data.clone(),
            gas_pool: GasPool::new(gas),
            read_only: false,
        }
    }

    /// Returns the 4-byte selector of the input, if any.
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|selector| selector.try_into().ok())
    }
}
