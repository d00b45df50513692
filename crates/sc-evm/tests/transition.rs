//! Tests for message dispatch and the classification of execution outcomes.

use std::sync::Arc;

use alloy_primitives::{address, bytes, Address, Bytes, U256};
use rstest::rstest;
use sc_evm::{
    constants::native::{CROSS_CHAIN_REDEEM_ADDRESS, CROSS_CHAIN_SEND_ADDRESS},
    processor::Eoa2EoaMessageProcessor,
    sc2sc::Sc2ScCodecs,
    test_utils::*,
    *,
};

const CONTRACT: Address = address!("0x0000000000000000000000000000000000c0ffee");
const GAS_LIMIT: u64 = 100_000;

fn chain(evm: Arc<MockEvm>) -> MessageProcessorChain {
    MessageProcessorChain::standard(
        &chain_config(true, true),
        evm,
        StaticProofVerifier(true),
        Arc::new(Sc2ScCodecs::rlp()),
    )
}

fn view_with_contract() -> AccountStateView {
    let mut view = funded_view(U256::from(1_000_000));
    view.set_code(CONTRACT, bytes!("0x00"));
    view
}

fn apply(
    view: &mut AccountStateView,
    processors: &MessageProcessorChain,
    message: &Message,
) -> ExecutionResult {
    let block = block_context();
    StateTransition::new(view, processors, &block).transition(message)
}

#[rstest]
#[case::contract_creation(None, "evm")]
#[case::smart_contract(Some(CONTRACT), "evm")]
#[case::funded_eoa(Some(ALICE), "eoa2eoa")]
#[case::empty_account(Some(BOB), "eoa2eoa")]
#[case::redeem_contract(Some(CROSS_CHAIN_REDEEM_ADDRESS), "sc2sc-redeem")]
#[case::send_contract(Some(CROSS_CHAIN_SEND_ADDRESS), "sc2sc-send")]
fn test_exactly_one_processor_accepts(#[case] callee: Option<Address>, #[case] expected: &str) {
    let processors = chain(Arc::new(MockEvm::default()));
    let mut view = view_with_contract();
    processors.init(&mut view, 0).unwrap();

    let invocation = Invocation {
        caller: ALICE,
        callee,
        value: U256::ZERO,
        input: Bytes::new(),
        gas_pool: GasPool::new(GAS_LIMIT),
        read_only: false,
    };
    let accepting: Vec<_> = processors
        .processors()
        .filter(|processor| processor.can_process(&invocation, &view, 0))
        .map(|processor| processor.name())
        .collect();
    assert_eq!(accepting, vec![expected]);
}

#[test]
fn test_standard_chain_registers_native_contracts_only_when_enabled() {
    let codecs = Arc::new(Sc2ScCodecs::rlp());
    let names = |config: &ChainConfig| {
        MessageProcessorChain::standard(
            config,
            MockEvm::default(),
            StaticProofVerifier(true),
            codecs.clone(),
        )
        .processors()
        .map(|processor| processor.name())
        .collect::<Vec<_>>()
    };

    assert_eq!(names(&chain_config(false, false)), vec!["eoa2eoa", "evm"]);
    assert_eq!(names(&chain_config(false, true)), vec!["eoa2eoa", "sc2sc-redeem", "evm"]);
    assert_eq!(
        names(&chain_config(true, true)),
        vec!["eoa2eoa", "sc2sc-send", "sc2sc-redeem", "evm"]
    );
}

#[test]
fn test_init_twice_fails() {
    let processors = chain(Arc::new(MockEvm::default()));
    let mut view = AccountStateView::default();
    processors.init(&mut view, 0).unwrap();
    assert!(view.is_native_contract_account(CROSS_CHAIN_REDEEM_ADDRESS));
    assert_eq!(view.nonce(CROSS_CHAIN_REDEEM_ADDRESS), 1);

    assert_eq!(
        processors.init(&mut view, 0),
        Err(InitializationError::AccountAlreadyExists(CROSS_CHAIN_SEND_ADDRESS))
    );
}

#[test]
fn test_no_processor_is_invalid() {
    let processors = MessageProcessorChain::new(vec![Box::new(Eoa2EoaMessageProcessor)]);
    let mut view = funded_view(U256::from(1_000_000));

    let message = Message::create(ALICE, U256::ZERO, GAS_LIMIT, bytes!("0x00"));
    let result = apply(&mut view, &processors, &message);

    assert!(!result.is_valid());
    assert!(matches!(
        result.error(),
        Some(ExecutionError::Invalid(reason)) if reason.contains("no message processor found")
    ));
    assert_eq!(view.nonce(ALICE), 0);
}

#[test]
fn test_transfer_between_eoas() {
    let processors = chain(Arc::new(MockEvm::default()));
    let mut view = funded_view(U256::from(1_000));

    let message = Message::call(ALICE, BOB, U256::from(400), GAS_LIMIT, Bytes::new());
    let result = apply(&mut view, &processors, &message);

    assert_eq!(
        result,
        ExecutionResult::Succeeded { gas_used: U256::from(21_000), return_data: Bytes::new() }
    );
    assert_eq!(view.balance(ALICE), U256::from(600));
    assert_eq!(view.balance(BOB), U256::from(400));
    assert_eq!(view.nonce(ALICE), 1);
}

#[test]
fn test_transfer_without_funds_fails_and_consumes_all_gas() {
    let processors = chain(Arc::new(MockEvm::default()));
    let mut view = funded_view(U256::from(10));

    let message = Message::call(ALICE, BOB, U256::from(400), GAS_LIMIT, Bytes::new());
    let result = apply(&mut view, &processors, &message);

    assert!(result.is_valid());
    assert!(!result.is_success());
    assert_eq!(result.gas_used(), U256::from(GAS_LIMIT));
    assert_eq!(view.balance(ALICE), U256::from(10));
    assert_eq!(view.nonce(ALICE), 1);
}

#[test]
fn test_revert_keeps_unused_gas() {
    let evm = Arc::new(MockEvm::reverting(5_000, bytes!("0xdeadbeef")));
    let processors = chain(evm.clone());
    let mut view = view_with_contract();

    let message = Message::call(ALICE, CONTRACT, U256::ZERO, GAS_LIMIT, Bytes::new());
    let result = apply(&mut view, &processors, &message);

    assert_eq!(
        result,
        ExecutionResult::Failed {
            gas_used: U256::from(26_000),
            reason: ExecutionError::Reverted(bytes!("0xdeadbeef")),
        }
    );
    assert_eq!(result.output(), Some(&bytes!("0xdeadbeef")));
    assert_eq!(view.nonce(ALICE), 1);
    assert_eq!(evm.calls()[0].gas, GAS_LIMIT - 21_000);
}

#[test]
fn test_failure_consumes_all_gas() {
    let processors = chain(Arc::new(MockEvm::halting(5_000, "OutOfGas")));
    let mut view = view_with_contract();

    let message = Message::call(ALICE, CONTRACT, U256::ZERO, GAS_LIMIT, Bytes::new());
    let result = apply(&mut view, &processors, &message);

    assert_eq!(
        result,
        ExecutionResult::Failed {
            gas_used: U256::from(GAS_LIMIT),
            reason: ExecutionError::Failed("OutOfGas".to_string()),
        }
    );
    assert_eq!(view.nonce(ALICE), 1);
}

#[rstest]
#[case::reverted(MockEvm::reverting(1_000, bytes!("0x6e6f")))]
#[case::halted(MockEvm::halting(1_000, "OutOfGas"))]
fn test_failed_creation_keeps_nonce_increment(#[case] evm: MockEvm) {
    let processors = chain(Arc::new(evm));
    let mut view = funded_view(U256::from(1_000));

    let message = Message::create(ALICE, U256::ZERO, GAS_LIMIT, bytes!("0x00"));
    let result = apply(&mut view, &processors, &message);

    assert!(result.is_valid());
    assert!(!result.is_success());
    assert_eq!(view.nonce(ALICE), 1);
}

#[test]
fn test_rejected_evm_call_is_invalid() {
    let processors = chain(Arc::new(MockEvm::rejecting("caller is a contract")));
    let mut view = view_with_contract();

    let message = Message::call(ALICE, CONTRACT, U256::ZERO, GAS_LIMIT, Bytes::new());
    let result = apply(&mut view, &processors, &message);

    assert!(!result.is_valid());
    assert_eq!(result.gas_used(), U256::ZERO);
    assert_eq!(view.nonce(ALICE), 0);
}

#[test]
fn test_success_reports_used_gas() {
    let evm = Arc::new(MockEvm::succeeding(1_234, bytes!("0x2a")));
    let processors = chain(evm.clone());
    let mut view = view_with_contract();

    let message = Message::call(ALICE, CONTRACT, U256::ZERO, GAS_LIMIT, bytes!("0x0100"));
    let result = apply(&mut view, &processors, &message);

    // 21000 base, 16 for the non-zero byte, 4 for the zero byte
    assert_eq!(
        result,
        ExecutionResult::Succeeded {
            gas_used: U256::from(21_020 + 1_234),
            return_data: bytes!("0x2a"),
        }
    );
    let calls = evm.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, Some(CONTRACT));
    assert_eq!(calls[0].input, bytes!("0x0100"));
    assert_eq!(calls[0].block_number, 1);
}

#[test]
fn test_intrinsic_gas_too_low_is_invalid() {
    let evm = Arc::new(MockEvm::default());
    let processors = chain(evm.clone());
    let mut view = view_with_contract();

    let message = Message::call(ALICE, CONTRACT, U256::ZERO, 20_999, Bytes::new());
    let result = apply(&mut view, &processors, &message);

    assert_eq!(
        result.error(),
        Some(&ExecutionError::Invalid("intrinsic gas too low: have 20999, want 21000".to_string()))
    );
    assert!(evm.calls().is_empty());
    assert_eq!(view.nonce(ALICE), 0);
}

#[test]
fn test_messages_of_a_block_see_each_other() {
    let processors = chain(Arc::new(MockEvm::default()));
    let mut view = funded_view(U256::from(1_000));
    let block = block_context();
    let mut transition = StateTransition::new(&mut view, &processors, &block);

    let first = Message::call(ALICE, BOB, U256::from(700), GAS_LIMIT, Bytes::new());
    let second = Message::call(ALICE, BOB, U256::from(700), GAS_LIMIT, Bytes::new()).with_nonce(1);
    assert!(transition.transition(&first).is_success());
    assert!(!transition.transition(&second).is_success());

    assert_eq!(transition.view().balance(BOB), U256::from(700));
    assert_eq!(transition.view().nonce(ALICE), 2);
}

#[test]
fn test_trace_options_record_the_last_result() {
    let processors = chain(Arc::new(MockEvm::default()));
    let mut view = funded_view(U256::from(1_000));
    let block = block_context().with_trace_options(TraceOptions::default());

    let message = Message::call(ALICE, BOB, U256::from(1), GAS_LIMIT, Bytes::new());
    StateTransition::new(&mut view, &processors, &block).transition(&message);

    let traced = block.take_evm_result().unwrap();
    assert!(traced.is_success());
    assert_eq!(traced.used_gas, 0);
    assert!(block.take_evm_result().is_none());
}

#[test]
fn test_execution_result_serializes_with_status() {
    let result = ExecutionResult::Failed {
        gas_used: U256::from(21_000),
        reason: ExecutionError::Reverted(bytes!("0x01")),
    };
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({
            "status": "failed",
            "gasUsed": "0x5208",
            "reason": { "kind": "reverted", "data": "0x01" }
        })
    );
}
