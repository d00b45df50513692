//! Native contracts of sidechain-to-sidechain messaging.
//!
//! Both contracts live at reserved addresses and are called with regular ABI-encoded input. The
//! send contract records outgoing messages for the next withdrawal certificate; the redeem contract
//! admits messages proven to have been sent on another sidechain.

use std::{path::PathBuf, sync::Arc};

use alloy_primitives::{Bytes, Log, B256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};

use super::{
    to_mainchain_format, CrossChainMessage, CrossChainMessageRedemptionValidator,
    CrossChainProtocolVersion, CrossChainRedeemMessage, ProofVerifier, RedemptionStorage,
    Sc2ScCodecs,
};
use crate::{
    constants::{
        gas::{COLD_SLOAD_COST, LOG, LOGDATA, LOGTOPIC, SSTORE_SET},
        native::{CROSS_CHAIN_REDEEM_ADDRESS, CROSS_CHAIN_SEND_ADDRESS},
    },
    processor::{ExecutionContext, MessageProcessor},
    AccountStateView, ExecutionError, InitializationError, Invocation,
};

sol! {
    /// Native contract admitting messages sent from other sidechains.
    interface ICrossChainRedeem {
        /// Emitted when a message is redeemed.
        event CrossChainMessageRedeemed(
            bytes32 indexed messageHash,
            uint32 messageType,
            bytes senderSidechain,
            bytes sender,
            bytes receiver
        );

        /// Redeems a message committed on its sending sidechain.
        function redeem(
            uint32 messageType,
            bytes senderSidechain,
            bytes sender,
            bytes receiverSidechain,
            bytes receiver,
            bytes payload,
            bytes certificateDataHash,
            bytes nextCertificateDataHash,
            bytes scCommitmentTreeRoot,
            bytes nextScCommitmentTreeRoot,
            bytes proof
        ) external returns (bytes32);

        /// Returns whether the message with `messageHash` was redeemed.
        function isRedeemed(bytes32 messageHash) external view returns (bool);
    }

    /// Native contract sending messages to other sidechains.
    interface ICrossChainSend {
        /// Emitted when a message is sent. `message` is the wire encoding of the message.
        event CrossChainMessageSent(
            bytes32 indexed messageHash,
            uint32 withdrawalEpoch,
            bytes message
        );

        /// Sends `payload` to `receiver` on the sidechain `receiverSidechain`.
        function send(
            uint32 messageType,
            bytes32 receiverSidechain,
            bytes receiver,
            bytes payload
        ) external returns (bytes32);
    }
}

fn log_gas(topics: u64, data: &[u8]) -> u64 {
    LOG + LOGTOPIC * topics + LOGDATA * data.len() as u64
}

fn ensure_no_value(invocation: &Invocation) -> Result<(), ExecutionError> {
    if !invocation.value.is_zero() {
        return Err(ExecutionError::failed("call value must be zero"));
    }
    Ok(())
}

fn ensure_plain_write(invocation: &Invocation) -> Result<(), ExecutionError> {
    if invocation.read_only {
        return Err(ExecutionError::failed("invalid write access to storage"));
    }
    Ok(())
}

fn unknown_function() -> ExecutionError {
    ExecutionError::reverted_with_reason("Requested function does not exist")
}

/// Redeems cross-chain messages at [`CROSS_CHAIN_REDEEM_ADDRESS`].
///
/// A message that fails field validation or any redemption check makes the whole transaction
/// invalid, whatever gas it carries: the checks run before any gas is charged. On success the
/// message hash is recorded in the same state transition.
#[derive(Debug)]
pub struct CrossChainRedeemMessageProcessor<V> {
    validator: CrossChainMessageRedemptionValidator<V>,
}

impl<V: ProofVerifier> CrossChainRedeemMessageProcessor<V> {
    /// Creates the processor for the sidechain `sidechain_id`, given in internal byte order.
    pub fn new(
        sidechain_id: B256,
        verification_key_path: PathBuf,
        verifier: V,
        codecs: Arc<Sc2ScCodecs>,
    ) -> Self {
        Self {
            validator: CrossChainMessageRedemptionValidator::new(
                sidechain_id,
                verification_key_path,
                verifier,
                codecs,
            ),
        }
    }

    fn redeem(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
    ) -> Result<Bytes, ExecutionError> {
        let call = ICrossChainRedeem::redeemCall::abi_decode(&invocation.input).map_err(|err| {
            ExecutionError::reverted_with_reason(&format!("invalid redeem call data: {err}"))
        })?;
        let message = CrossChainMessage::new(
            CrossChainProtocolVersion::V1,
            call.messageType,
            call.senderSidechain,
            call.sender,
            call.receiverSidechain,
            call.receiver,
            call.payload,
        )
        .map_err(ExecutionError::invalid)?;
        let redeem = CrossChainRedeemMessage::new(
            message,
            call.certificateDataHash,
            call.nextCertificateDataHash,
            call.scCommitmentTreeRoot,
            call.nextScCommitmentTreeRoot,
            call.proof,
        )
        .map_err(ExecutionError::invalid)?;
        let hash = self.validator.validate(&*view, &redeem).map_err(|err| {
            tracing::warn!(%err, "cross-chain redeem message rejected");
            ExecutionError::invalid(err)
        })?;

        ensure_no_value(invocation)?;
        ensure_plain_write(invocation)?;
        // replay check, both roots, and the redeemed flag
        invocation.gas_pool.sub_gas(3 * COLD_SLOAD_COST + SSTORE_SET)?;
        view.record_redeemed(hash);
        tracing::debug!(%hash, "cross-chain message redeemed");

        let message = redeem.message();
        let event = ICrossChainRedeem::CrossChainMessageRedeemed {
            messageHash: hash.0,
            messageType: message.message_type(),
            senderSidechain: message.sender_sidechain().clone(),
            sender: message.sender().clone(),
            receiver: message.receiver().clone(),
        };
        let data = event.encode_log_data();
        invocation.gas_pool.sub_gas(log_gas(data.topics().len() as u64, &data.data))?;
        view.add_log(Log { address: CROSS_CHAIN_REDEEM_ADDRESS, data });

        Ok(hash.0.abi_encode().into())
    }

    fn is_redeemed(
        &self,
        invocation: &mut Invocation,
        view: &AccountStateView,
    ) -> Result<Bytes, ExecutionError> {
        let call = ICrossChainRedeem::isRedeemedCall::abi_decode(&invocation.input).map_err(
            |err| ExecutionError::reverted_with_reason(&format!("invalid call data: {err}")),
        )?;
        invocation.gas_pool.sub_gas(COLD_SLOAD_COST)?;
        let redeemed = view.hash_already_redeemed(&call.messageHash.into());
        Ok(redeemed.abi_encode().into())
    }
}

impl<V: ProofVerifier> MessageProcessor for CrossChainRedeemMessageProcessor<V> {
    fn name(&self) -> &'static str {
        "sc2sc-redeem"
    }

    fn init(&self, view: &mut AccountStateView, _epoch: u32) -> Result<(), InitializationError> {
        view.add_native_contract_account(CROSS_CHAIN_REDEEM_ADDRESS)
    }

    fn can_process(&self, invocation: &Invocation, _view: &AccountStateView, _epoch: u32) -> bool {
        invocation.callee == Some(CROSS_CHAIN_REDEEM_ADDRESS)
    }

    fn process(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        _context: &ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError> {
        let selector = invocation.selector();
        if selector == Some(ICrossChainRedeem::redeemCall::SELECTOR) {
            return self.redeem(invocation, view);
        }
        ensure_no_value(invocation)?;
        match selector {
            Some(selector) if selector == ICrossChainRedeem::isRedeemedCall::SELECTOR => {
                self.is_redeemed(invocation, view)
            }
            _ => Err(unknown_function()),
        }
    }
}

/// Sends cross-chain messages from [`CROSS_CHAIN_SEND_ADDRESS`].
///
/// The sender of a message is the caller, and its sending sidechain is this sidechain in mainchain
/// byte order. Sent messages are listed per withdrawal epoch and announced with a log carrying
/// their wire encoding.
#[derive(Debug)]
pub struct CrossChainSendMessageProcessor {
    sidechain_id: B256,
    codecs: Arc<Sc2ScCodecs>,
}

impl CrossChainSendMessageProcessor {
    /// Creates the processor for the sidechain `sidechain_id`, given in internal byte order.
    pub const fn new(sidechain_id: B256, codecs: Arc<Sc2ScCodecs>) -> Self {
        Self { sidechain_id, codecs }
    }

    fn send(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        withdrawal_epoch: u32,
    ) -> Result<Bytes, ExecutionError> {
        ensure_plain_write(invocation)?;
        let call = ICrossChainSend::sendCall::abi_decode(&invocation.input).map_err(|err| {
            ExecutionError::reverted_with_reason(&format!("invalid send call data: {err}"))
        })?;
        // message slot and epoch counter
        invocation.gas_pool.sub_gas(2 * SSTORE_SET)?;

        let message = CrossChainMessage::new(
            CrossChainProtocolVersion::V1,
            call.messageType,
            Bytes::copy_from_slice(to_mainchain_format(&self.sidechain_id).as_slice()),
            Bytes::copy_from_slice(invocation.caller.as_slice()),
            Bytes::copy_from_slice(call.receiverSidechain.as_slice()),
            call.receiver,
            call.payload,
        )
        .map_err(|err| ExecutionError::reverted_with_reason(&err.to_string()))?;

        let hash = self.codecs.message_hash(&message);
        view.record_sent_message(withdrawal_epoch, hash);

        let event = ICrossChainSend::CrossChainMessageSent {
            messageHash: hash.0,
            withdrawalEpoch: withdrawal_epoch,
            message: self.codecs.message.encode(&message).into(),
        };
        let data = event.encode_log_data();
        invocation.gas_pool.sub_gas(log_gas(data.topics().len() as u64, &data.data))?;
        view.add_log(Log { address: CROSS_CHAIN_SEND_ADDRESS, data });
        tracing::debug!(%hash, withdrawal_epoch, "cross-chain message sent");

        Ok(hash.0.abi_encode().into())
    }
}

impl MessageProcessor for CrossChainSendMessageProcessor {
    fn name(&self) -> &'static str {
        "sc2sc-send"
    }

    fn init(&self, view: &mut AccountStateView, _epoch: u32) -> Result<(), InitializationError> {
        view.add_native_contract_account(CROSS_CHAIN_SEND_ADDRESS)
    }

    fn can_process(&self, invocation: &Invocation, _view: &AccountStateView, _epoch: u32) -> bool {
        invocation.callee == Some(CROSS_CHAIN_SEND_ADDRESS)
    }

    fn process(
        &self,
        invocation: &mut Invocation,
        view: &mut AccountStateView,
        context: &ExecutionContext<'_>,
    ) -> Result<Bytes, ExecutionError> {
        ensure_no_value(invocation)?;
        match invocation.selector() {
            Some(selector) if selector == ICrossChainSend::sendCall::SELECTOR => {
                self.send(invocation, view, context.block.withdrawal_epoch_number)
            }
            _ => Err(unknown_function()),
        }
    }
}

