//! Tests for executing messages through revm.

use std::{collections::BTreeMap, sync::Arc};

use alloy_primitives::{address, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use revm::bytecode::opcode::{BLOCKHASH, MSTORE, PUSH0, RETURN};
use sc_evm::{sc2sc::Sc2ScCodecs, test_utils::*, *};

const GAS_LIMIT: u64 = 1_000_000;

fn processors() -> MessageProcessorChain {
    MessageProcessorChain::standard(
        &chain_config(false, false),
        RevmBackend::default(),
        StaticProofVerifier(false),
        Arc::new(Sc2ScCodecs::rlp()),
    )
}

/// Deploys the Storage contract holding `42` and returns its address.
fn deploy_storage(view: &mut AccountStateView, processors: &MessageProcessorChain) -> Address {
    let block = block_context();
    let message =
        Message::create(ALICE, U256::ZERO, GAS_LIMIT, storage_contract_init_code(U256::from(42)));
    let result = StateTransition::new(view, processors, &block).transition(&message);
    assert!(result.is_success(), "{result:?}");
    ALICE.create(0)
}

fn call(
    view: &mut AccountStateView,
    processors: &MessageProcessorChain,
    to: Address,
    input: impl Into<Bytes>,
) -> ExecutionResult {
    let nonce = view.nonce(ALICE);
    let block = block_context();
    let message = Message::call(ALICE, to, U256::ZERO, GAS_LIMIT, input.into()).with_nonce(nonce);
    StateTransition::new(view, processors, &block).transition(&message)
}

#[test]
fn test_storage_contract_deployment() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let block = block_context();

    let message =
        Message::create(ALICE, U256::ZERO, GAS_LIMIT, storage_contract_init_code(U256::from(42)));
    let result = StateTransition::new(&mut view, &processors, &block).transition(&message);

    assert!(result.is_success(), "{result:?}");
    assert!(result.gas_used() > U256::ZERO);
    assert!(result.gas_used() < U256::from(GAS_LIMIT));
    let deployed = result.output().unwrap();
    assert!(!deployed.is_empty());

    let contract = ALICE.create(0);
    assert!(view.is_smart_contract_account(contract));
    assert_eq!(&view.code(contract), deployed);
    assert_eq!(view.storage_at(contract, U256::ZERO), U256::from(42));
    assert_eq!(view.nonce(ALICE), 1);
    assert_eq!(view.logs().len(), 3);
    assert!(view.logs().iter().all(|log| log.address == contract));
}

#[test]
fn test_storage_contract_calls() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let contract = deploy_storage(&mut view, &processors);

    let result = call(&mut view, &processors, contract, IStorage::retrieveCall {}.abi_encode());
    assert_eq!(result.output().unwrap(), &U256::from(42).abi_encode());

    let store = IStorage::storeCall { value: U256::from(7) };
    let result = call(&mut view, &processors, contract, store.abi_encode());
    assert!(result.is_success(), "{result:?}");
    assert!(call(&mut view, &processors, contract, IStorage::incCall {}.abi_encode()).is_success());

    let result = call(&mut view, &processors, contract, IStorage::retrieveCall {}.abi_encode());
    assert_eq!(result.output().unwrap(), &U256::from(8).abi_encode());
    assert_eq!(view.storage_at(contract, U256::ZERO), U256::from(8));
    // one increment per message, creation included
    assert_eq!(view.nonce(ALICE), 5);
}

#[test]
fn test_unknown_selector_reverts() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let contract = deploy_storage(&mut view, &processors);

    let result = call(&mut view, &processors, contract, Bytes::from_static(&[1, 2, 3, 4]));

    assert!(result.is_valid());
    assert!(matches!(result.error(), Some(ExecutionError::Reverted(_))));
    assert!(result.gas_used() < U256::from(GAS_LIMIT));
    assert_eq!(view.storage_at(contract, U256::ZERO), U256::from(42));
}

#[test]
fn test_revert_discards_state_changes() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let contract = address!("0x0000000000000000000000000000000000c0ffee");
    let code = CodeBuilder::default().sstore(0, U256::from(1)).revert_data(b"nope").build();
    view.set_code(contract, code);

    let result = call(&mut view, &processors, contract, Bytes::new());

    assert_eq!(result.error(), Some(&ExecutionError::Reverted(Bytes::from_static(b"nope"))));
    assert_eq!(view.storage_at(contract, U256::ZERO), U256::ZERO);
    assert_eq!(view.nonce(ALICE), 1);
}

#[test]
fn test_out_of_gas_consumes_all_gas() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let contract = address!("0x0000000000000000000000000000000000c0ffee");
    view.set_code(contract, CodeBuilder::default().spin().build());

    let result = call(&mut view, &processors, contract, Bytes::new());

    assert!(result.is_valid());
    assert!(matches!(result.error(), Some(ExecutionError::Failed(_))));
    assert_eq!(result.gas_used(), U256::from(GAS_LIMIT));
    assert_eq!(view.nonce(ALICE), 1);
}

#[test]
fn test_deployment_with_value_to_non_payable_constructor_reverts() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let block = block_context();

    let message =
        Message::create(ALICE, U256::from(1), GAS_LIMIT, storage_contract_init_code(U256::from(1)));
    let result = StateTransition::new(&mut view, &processors, &block).transition(&message);

    assert!(matches!(result.error(), Some(ExecutionError::Reverted(_))));
    assert!(!view.is_smart_contract_account(ALICE.create(0)));
    assert_eq!(view.balance(ALICE), U256::from(1_000_000));
    assert_eq!(view.nonce(ALICE), 1);
}

#[test]
fn test_failed_deployments_keep_nonce_increment() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let block = block_context();
    let mut transition = StateTransition::new(&mut view, &processors, &block);

    let reverting = CodeBuilder::default().revert_data(b"no").build();
    let result = transition.transition(&Message::create(ALICE, U256::ZERO, GAS_LIMIT, reverting));
    assert_eq!(result.error(), Some(&ExecutionError::Reverted(Bytes::from_static(b"no"))));
    assert_eq!(transition.view().nonce(ALICE), 1);

    let spinning = CodeBuilder::default().spin().build();
    let message = Message::create(ALICE, U256::ZERO, GAS_LIMIT, spinning).with_nonce(1);
    let result = transition.transition(&message);
    assert!(matches!(result.error(), Some(ExecutionError::Failed(_))));
    assert_eq!(transition.view().nonce(ALICE), 2);

    // the next deployment lands at the address of the current nonce
    let message =
        Message::create(ALICE, U256::ZERO, GAS_LIMIT, deploy_code(&[0x00])).with_nonce(2);
    assert!(transition.transition(&message).is_success());
    assert!(transition.view().is_smart_contract_account(ALICE.create(2)));
    assert!(!transition.view().is_smart_contract_account(ALICE.create(0)));
    assert_eq!(transition.view().nonce(ALICE), 3);
}

#[test]
fn test_value_call_without_funds_fails_like_a_transfer() {
    let processors = processors();
    let contract = address!("0x0000000000000000000000000000000000c0ffee");
    let block = block_context();

    let mut view = funded_view(U256::from(10));
    view.set_code(contract, CodeBuilder::default().return_data(&[1]).build());
    let mut transition = StateTransition::new(&mut view, &processors, &block);
    let message = Message::call(ALICE, contract, U256::from(400), 100_000, Bytes::new());
    let to_contract = transition.transition(&message);
    let message = Message::call(ALICE, BOB, U256::from(400), 100_000, Bytes::new()).with_nonce(1);
    let to_account = transition.transition(&message);

    for result in [&to_contract, &to_account] {
        assert!(result.is_valid(), "{result:?}");
        assert!(matches!(result.error(), Some(ExecutionError::Failed(_))));
        assert_eq!(result.gas_used(), U256::from(100_000));
    }
    assert_eq!(view.balance(ALICE), U256::from(10));
    assert_eq!(view.balance(contract), U256::ZERO);
    assert_eq!(view.nonce(ALICE), 2);
}

#[test]
fn test_backend_commits_to_the_store() {
    let contract = address!("0x0000000000000000000000000000000000c0ffee");
    let mut db = StateDb::new();
    db.set_balance(ALICE, U256::from(100));
    db.set_code(contract, CodeBuilder::default().sstore(0, U256::from(5)).build());
    let block = block_context();

    let params = EvmParams {
        from: ALICE,
        to: Some(contract),
        value: U256::from(30),
        input: Bytes::new(),
        gas: 100_000,
        gas_price: U256::ZERO,
        context: EvmContext::from_block(&block),
    };
    let result = RevmBackend::default().apply(&mut db, params).unwrap();

    assert!(result.is_success(), "{result:?}");
    assert!(result.used_gas > 20_000);
    assert_eq!(db.storage_at(contract, U256::ZERO), U256::from(5));
    assert_eq!(db.account(contract).map(|info| info.balance), Some(U256::from(30)));
    assert_eq!(db.account(ALICE).map(|info| info.balance), Some(U256::from(70)));
}

#[test]
fn test_deploy_code_wrapper() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let runtime = CodeBuilder::default().return_data(&[0xaa; 3]).build();
    let block = block_context();

    let message = Message::create(ALICE, U256::ZERO, GAS_LIMIT, deploy_code(&runtime));
    let result = StateTransition::new(&mut view, &processors, &block).transition(&message);
    assert_eq!(result.output(), Some(&runtime));

    let result = call(&mut view, &processors, ALICE.create(0), Bytes::new());
    assert_eq!(result.output(), Some(&Bytes::from_static(&[0xaa; 3])));
}

fn block_hash_reader(height: u8) -> Bytes {
    CodeBuilder::default()
        .push([height])
        .op([BLOCKHASH, PUSH0, MSTORE])
        .push([32])
        .op([PUSH0, RETURN])
        .build()
}

#[test]
fn test_block_hash_comes_from_the_block_context() {
    let processors = processors();
    let mut view = funded_view(U256::from(1_000_000));
    let known = address!("0x00000000000000000000000000000000000b1001");
    let unknown = address!("0x00000000000000000000000000000000000b1002");
    view.set_code(known, block_hash_reader(9));
    view.set_code(unknown, block_hash_reader(8));

    let hashes = BTreeMap::from([(9u64, B256::repeat_byte(0x99))]);
    let block = BlockContext::new(
        FORGER,
        1_700_000_000,
        U256::ZERO,
        U256::from(30_000_000u64),
        10,
        0,
        0,
        TEST_CHAIN_ID,
        B256::ZERO,
        hashes,
    );
    let mut transition = StateTransition::new(&mut view, &processors, &block);

    let message = Message::call(ALICE, known, U256::ZERO, GAS_LIMIT, Bytes::new());
    let result = transition.transition(&message);
    assert_eq!(result.output(), Some(&Bytes::from(B256::repeat_byte(0x99).to_vec())));

    let message = Message::call(ALICE, unknown, U256::ZERO, GAS_LIMIT, Bytes::new()).with_nonce(1);
    let result = transition.transition(&message);
    assert_eq!(result.output(), Some(&Bytes::from(B256::ZERO.to_vec())));
}
