use crate::constants::gas::{
    INITCODE_WORD_GAS, TX_CREATE_GAS, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS, TX_GAS,
};

/// The error returned when a [`GasPool`] cannot cover a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("out of gas: requested {requested}, available {available}")]
pub struct OutOfGasError {
    /// The amount that was requested.
    pub requested: u64,
    /// The amount left in the pool at the time of the request.
    pub available: u64,
}

/// The gas budget of a single message execution.
///
/// The remaining amount only ever decreases. A failed [`GasPool::sub_gas`] leaves the pool
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPool {
    available: u64,
}

impl GasPool {
    /// Creates a pool holding `limit` gas.
    pub const fn new(limit: u64) -> Self {
        Self { available: limit }
    }

    /// Returns the remaining gas.
    pub const fn get_gas(&self) -> u64 {
        self.available
    }

    /// Deducts `amount` from the pool.
    pub fn sub_gas(&mut self, amount: u64) -> Result<(), OutOfGasError> {
        if amount > self.available {
            return Err(OutOfGasError { requested: amount, available: self.available });
        }
        self.available -= amount;
        tracing::trace!(amount, remaining = self.available, "gas charged");
        Ok(())
    }

    /// Consumes everything left in the pool.
    pub fn consume_all(&mut self) {
        self.available = 0;
    }
}

/// Computes the intrinsic gas of a message carrying `data`.
///
/// Creation messages additionally pay for contract creation and for every initcode word.
pub fn intrinsic_gas(data: &[u8], is_create: bool) -> u64 {
    let zeros = data.iter().filter(|byte| **byte == 0).count() as u64;
    let non_zeros = data.len() as u64 - zeros;

    let mut gas = TX_GAS + zeros * TX_DATA_ZERO_GAS + non_zeros * TX_DATA_NON_ZERO_GAS;
    if is_create {
        gas += TX_CREATE_GAS + (data.len() as u64).div_ceil(32) * INITCODE_WORD_GAS;
    }
    gas
}
