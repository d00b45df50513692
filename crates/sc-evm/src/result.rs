use alloy_primitives::{Bytes, U256};
use serde::Serialize;

use crate::OutOfGasError;

/// The ways a message processor can fail to execute an invocation.
///
/// The variant decides both the outcome class and what happens to the gas left in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ExecutionError {
    /// The invoked code reverted. The unused gas is returned to the caller.
    #[error("execution reverted: {0}")]
    Reverted(Bytes),
    /// Execution failed. All remaining gas is consumed.
    #[error("execution failed: {0}")]
    Failed(String),
    /// The message is malformed and must not be included in a block.
    #[error("invalid message: {0}")]
    Invalid(String),
}

impl ExecutionError {
    /// Creates a [`ExecutionError::Failed`] from anything printable.
    pub fn failed(reason: impl core::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }

    /// Creates a [`ExecutionError::Invalid`] from anything printable.
    pub fn invalid(reason: impl core::fmt::Display) -> Self {
        Self::Invalid(reason.to_string())
    }

    /// Creates a [`ExecutionError::Reverted`] whose data is the ABI `Error(string)` encoding of
    /// `reason`.
    pub fn reverted_with_reason(reason: &str) -> Self {
        use alloy_sol_types::{Revert, SolError};
        Self::Reverted(Revert { reason: reason.to_string() }.abi_encode().into())
    }
}

impl From<OutOfGasError> for ExecutionError {
    fn from(err: OutOfGasError) -> Self {
        Self::Failed(err.to_string())
    }
}

/// The classified outcome of applying one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExecutionResult {
    /// The message executed successfully.
    #[serde(rename_all = "camelCase")]
    Succeeded {
        /// Gas used, intrinsic gas included.
        gas_used: U256,
        /// Data returned by the call.
        return_data: Bytes,
    },
    /// The message is valid and was charged, but its execution failed and its effects were
    /// reverted.
    #[serde(rename_all = "camelCase")]
    Failed {
        /// Gas used, intrinsic gas included.
        gas_used: U256,
        /// Why execution failed. Either [`ExecutionError::Reverted`] or
        /// [`ExecutionError::Failed`].
        reason: ExecutionError,
    },
    /// The message must not appear in a block.
    Invalid {
        /// Why the message is invalid.
        reason: ExecutionError,
    },
}

impl ExecutionResult {
    /// Returns whether the message executed successfully.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns whether the message is valid, whether or not its execution succeeded.
    pub const fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid { .. })
    }

    /// Returns the gas used. Invalid messages use no gas.
    pub const fn gas_used(&self) -> U256 {
        match self {
            Self::Succeeded { gas_used, .. } | Self::Failed { gas_used, .. } => *gas_used,
            Self::Invalid { .. } => U256::ZERO,
        }
    }

    /// Returns the data returned by the call, or the revert data of a reverted call.
    pub fn output(&self) -> Option<&Bytes> {
        match self {
            Self::Succeeded { return_data, .. } => Some(return_data),
            Self::Failed { reason: ExecutionError::Reverted(data), .. } => Some(data),
            _ => None,
        }
    }

    /// Returns the error of a failed or invalid message.
    pub const fn error(&self) -> Option<&ExecutionError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { reason, .. } | Self::Invalid { reason } => Some(reason),
        }
    }
}

/// The error returned when a message processor cannot be set up at genesis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitializationError {
    /// The reserved account of a native contract already exists.
    #[error("native contract account {0} already exists")]
    AccountAlreadyExists(alloy_primitives::Address),
    /// A processor-specific failure.
    #[error("message processor initialization failed: {0}")]
    Other(String),
}
