//! Execution core of an account-model sidechain.
//!
//! A transaction is turned into a [`Message`], charged intrinsic gas, and handed to a
//! [`MessageProcessorChain`] that dispatches it to exactly one [`MessageProcessor`]. Every outcome
//! is classified into an [`ExecutionResult`] that decides whether the enclosing block is valid.
//! Messages bridged in from a companion chain are settled through the [`sc2sc`] redemption
//! protocol.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod config;
pub use config::*;

mod context;
pub use context::*;

pub mod evm;
pub use evm::{EvmApply, EvmApplyError, EvmContext, EvmParams, EvmResult, RevmBackend};

mod gas;
pub use gas::*;

mod message;
pub use message::*;

pub mod processor;
pub use processor::{MessageProcessor, MessageProcessorChain};

mod result;
pub use result::*;

pub mod sc2sc;

mod state;
pub use state::*;

mod transition;
pub use transition::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use alloy_primitives;
pub use revm;
