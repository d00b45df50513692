//! Message processors and the chain that dispatches messages to them.
//!
//! Every message is handled by exactly one processor. The chain asks each registered processor in
//! order whether it can process the invocation, and hands the invocation to the first that can.
//! When none can, the message is invalid.

use std::sync::Arc;

use alloy_primitives::Bytes;

use crate::{
    sc2sc::{
        CrossChainRedeemMessageProcessor, CrossChainSendMessageProcessor, ProofVerifier,
        Sc2ScCodecs,
    },
    AccountStateView, BlockContext, ChainConfig, EvmApply, EvmResult, ExecutionError,
    InitializationError, Invocation, Message,
};

mod eoa;
pub use eoa::*;

mod evm;
pub use evm::*;

/// What a processor sees of the message being applied.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// The block the message belongs to.
    pub block: &'a BlockContext,
    /// The message being applied.
    pub message: &'a Message,
}

/// A handler for one category of message.
pub trait MessageProcessor: core::fmt::Debug {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// Sets the processor up in the genesis state.
    fn init(
        &self,
        view: &mut AccountStateView,
        consensus_epoch_number: u32,
    ) -> Result<(), InitializationError>;

    /// Returns whether this processor handles `invocation`. Must not modify state.
    fn can_process(
        &self,
        invocation: &Invocation,
        view: &AccountStateView,
        consensus_epoch_number: u32,
    ) -> bool;

    /// Applies `invocation`, charging its gas pool.
    fn process(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        context: &ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError>;

    /// Returns whether the processor traces its own execution.
    fn custom_tracing(&self) -> bool {
        false
    }
}

/// The ordered, immutable set of registered message processors.
#[derive(Debug)]
pub struct MessageProcessorChain {
    processors: Vec<Box<dyn MessageProcessor>>,
}

impl MessageProcessorChain {
    /// Creates a chain dispatching to `processors` in the given order.
    pub fn new(processors: Vec<Box<dyn MessageProcessor>>) -> Self {
        Self { processors }
    }

    /// Creates the chain used by a sidechain configured with `config`.
    ///
    /// Plain transfers come first, the cross-chain native contracts are registered only when the
    /// sidechain takes part in cross-chain messaging, and the EVM comes last.
    pub fn standard(
        config: &ChainConfig,
        evm: impl EvmApply + 'static,
        verifier: impl ProofVerifier + 'static,
        codecs: Arc<Sc2ScCodecs>,
    ) -> Self {
        let mut processors: Vec<Box<dyn MessageProcessor>> =
            vec![Box::new(Eoa2EoaMessageProcessor)];
        if config.sc2sc.can_send_messages {
            processors.push(Box::new(CrossChainSendMessageProcessor::new(
                config.sidechain_id,
                codecs.clone(),
            )));
        }
        if config.sc2sc.can_receive_messages {
            processors.push(Box::new(CrossChainRedeemMessageProcessor::new(
                config.sidechain_id,
                config.sc2sc.verification_key_path.clone().unwrap_or_default(),
                verifier,
                codecs,
            )));
        }
        processors.push(Box::new(EvmMessageProcessor::new(evm)));
        Self::new(processors)
    }

    /// Returns the registered processors in dispatch order.
    pub fn processors(&self) -> impl Iterator<Item = &dyn MessageProcessor> {
        self.processors.iter().map(|processor| processor.as_ref())
    }

    /// Initializes every processor in the genesis state, in registration order.
    pub fn init(
        &self,
        view: &mut AccountStateView,
        consensus_epoch_number: u32,
    ) -> Result<(), InitializationError> {
        for processor in &self.processors {
            processor.init(view, consensus_epoch_number)?;
            tracing::debug!(processor = processor.name(), "message processor initialized");
        }
        Ok(())
    }

    /// Returns the first processor that can handle `invocation`.
    pub fn find(
        &self,
        invocation: &Invocation,
        view: &AccountStateView,
        consensus_epoch_number: u32,
    ) -> Option<&dyn MessageProcessor> {
        self.processors()
            .find(|processor| processor.can_process(invocation, view, consensus_epoch_number))
    }

    /// Dispatches `invocation` to the first processor that can handle it.
    ///
    /// Fails with [`ExecutionError::Invalid`] when no processor matches.
    pub fn process(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        context: &ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError> {
        let epoch = context.block.consensus_epoch_number;
        let Some(processor) = self.find(invocation, view, epoch) else {
            tracing::warn!(callee = ?invocation.callee, "no message processor found");
            let target = invocation
                .callee
                .map_or_else(|| "contract creation".to_string(), |callee| callee.to_string());
            return Err(ExecutionError::Invalid(format!(
                "no message processor found for invocation to {target}"
            )));
        };
        tracing::debug!(
            processor = processor.name(),
            caller = %invocation.caller,
            "dispatching invocation"
        );

        let gas = invocation.gas_pool.get_gas();
        let result = processor.process(invocation, view, context);

        if context.block.trace_options().is_some() && !processor.custom_tracing() {
            context.block.set_evm_result(EvmResult {
                used_gas: gas.saturating_sub(invocation.gas_pool.get_gas()),
                return_data: match &result {
                    Ok(data) | Err(ExecutionError::Reverted(data)) => data.clone(),
                    Err(_) => Bytes::new(),
                },
                reverted: matches!(result, Err(ExecutionError::Reverted(_))),
                evm_error: match &result {
                    Err(ExecutionError::Failed(reason) | ExecutionError::Invalid(reason)) => {
                        Some(reason.clone())
                    }
                    _ => None,
                },
                ..Default::default()
            });
        }
        result
    }
}
