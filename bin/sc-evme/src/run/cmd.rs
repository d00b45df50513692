use std::{path::PathBuf, sync::Arc, time::Instant};

use alloy_primitives::{Address, Bytes, Log, B256, U256};
use clap::Parser;
use sc_evm::{
    sc2sc::Sc2ScCodecs, AccountStateView, BlockContext, ChainConfig, ExecutionResult, Message,
    MessageProcessorChain, NoBlockHashes, RevmBackend, StateDb, StateTransition, TraceOptions,
};
use serde::Serialize;

use super::UnavailableVerifier;
use crate::common::{load_hex, EvmeError, Result};

/// Execute one message through the message processors
#[derive(Parser, Debug)]
pub struct Cmd {
    /// EVM bytecode as hex string, deployed at the receiver or used as init code with `--create`
    #[arg(value_name = "CODE")]
    pub code: Option<String>,

    /// File containing EVM code. If '-' is specified, code is read from stdin
    #[arg(long = "codefile")]
    pub codefile: Option<String>,

    /// Create a contract instead of calling the receiver
    #[arg(long = "create")]
    pub create: bool,

    /// Gas limit of the message, intrinsic gas included
    #[arg(long = "gas", default_value = "10000000")]
    pub gas: u64,

    /// Input data (hex string). Appended to the init code with `--create`
    #[arg(long = "input")]
    pub input: Option<String>,

    /// File containing the input data
    #[arg(long = "inputfile")]
    pub inputfile: Option<String>,

    /// The message receiver
    #[arg(
        long = "receiver",
        visible_aliases = ["to"],
        default_value = "0x0000000000000000000000000000000000001000"
    )]
    pub receiver: Address,

    /// The message sender
    #[arg(
        long = "sender",
        visible_aliases = ["from"],
        default_value = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    )]
    pub sender: Address,

    /// Genesis balance of the sender
    #[arg(long = "sender.balance", default_value = "1000000000000000000000")]
    pub sender_balance: U256,

    /// Value sent with the message
    #[arg(long = "value", default_value = "0")]
    pub value: U256,

    /// Chain configuration file (JSON). Defaults to a sidechain without cross-chain messaging
    #[arg(long = "config", env = "SC_EVME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Block environment
    #[command(flatten)]
    pub block: BlockArgs,

    /// Record the EVM outcome alongside the result
    #[arg(long = "trace")]
    pub trace: bool,
}

/// Block environment arguments.
#[derive(Parser, Debug, Clone)]
pub struct BlockArgs {
    /// Block number
    #[arg(long = "block.number", default_value = "1")]
    pub number: u64,

    /// Block timestamp
    #[arg(long = "block.timestamp", default_value = "1")]
    pub timestamp: u64,

    /// Forger credited as block coinbase
    #[arg(long = "block.coinbase", default_value = "0x0000000000000000000000000000000000000000")]
    pub coinbase: Address,

    /// Block gas limit
    #[arg(long = "block.gaslimit", default_value = "30000000")]
    pub gas_limit: u64,

    /// Base fee per gas
    #[arg(long = "block.basefee", default_value = "0")]
    pub base_fee: u64,

    /// Block randomness
    #[arg(
        long = "block.random",
        default_value = "0x0000000000000000000000000000000000000000000000000000000000000000"
    )]
    pub random: B256,

    /// Consensus epoch of the block
    #[arg(long = "epoch.consensus", default_value = "0")]
    pub consensus_epoch: u32,

    /// Withdrawal epoch of the block
    #[arg(long = "epoch.withdrawal", default_value = "0")]
    pub withdrawal_epoch: u32,
}

/// What `run` prints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    /// Classification of the message.
    pub result: ExecutionResult,
    /// Logs emitted by the message.
    pub logs: Vec<Log>,
    /// Address of the created contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// The EVM outcome, with `--trace`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceSummary>,
}

/// The EVM outcome recorded for a traced message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    /// Gas used after intrinsic gas.
    pub used_gas: u64,
    /// Returned data.
    pub return_data: Bytes,
    /// Whether execution reverted.
    pub reverted: bool,
    /// The halt reason, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evm_error: Option<String>,
}

impl Cmd {
    /// Executes the command and prints the outcome as JSON.
    pub fn run(&self) -> Result<()> {
        let start = Instant::now();
        let outcome = self.execute()?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        eprintln!("execution time:  {:?}", start.elapsed());
        Ok(())
    }

    fn chain_config(&self) -> Result<ChainConfig> {
        let Some(path) = &self.config else { return Ok(ChainConfig::default()) };
        let config = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        tracing::info!(path = %path.display(), "chain configuration loaded");
        Ok(config)
    }

    fn message(&self, code: Bytes, input: Bytes) -> Message {
        if self.create {
            let init_code = [code.as_ref(), input.as_ref()].concat().into();
            Message::create(self.sender, self.value, self.gas, init_code)
        } else {
            Message::call(self.sender, self.receiver, self.value, self.gas, input)
        }
    }

    /// Builds the genesis state, applies the message and collects its outcome.
    pub fn execute(&self) -> Result<RunOutcome> {
        let code = load_hex(self.code.as_deref(), self.codefile.as_deref())?;
        let input = load_hex(self.input.as_deref(), self.inputfile.as_deref())?;
        if self.create && code.is_empty() {
            return Err(EvmeError::InvalidInput("--create needs init code".to_string()));
        }
        let config = self.chain_config()?;

        let mut db = StateDb::new();
        db.set_balance(self.sender, self.sender_balance);
        if !self.create && !code.is_empty() {
            db.set_code(self.receiver, code.clone());
        }
        let mut view = AccountStateView::new(db);

        let processors = MessageProcessorChain::standard(
            &config,
            RevmBackend::default(),
            UnavailableVerifier,
            Arc::new(Sc2ScCodecs::rlp()),
        );
        processors.init(&mut view, self.block.consensus_epoch)?;

        let mut block = BlockContext::new(
            self.block.coinbase,
            self.block.timestamp,
            U256::from(self.block.base_fee),
            U256::from(self.block.gas_limit),
            self.block.number,
            self.block.consensus_epoch,
            self.block.withdrawal_epoch,
            config.chain_id,
            self.block.random,
            NoBlockHashes,
        );
        if self.trace {
            block = block.with_trace_options(TraceOptions::default());
        }

        let nonce = view.nonce(self.sender);
        let message = self.message(code, input).with_nonce(nonce);
        let result = StateTransition::new(&mut view, &processors, &block).transition(&message);
        tracing::info!(
            gas_used = %result.gas_used(),
            success = result.is_success(),
            "message applied"
        );

        let contract_address =
            (self.create && result.is_success()).then(|| self.sender.create(nonce));
        let trace = block.take_evm_result().map(|evm| TraceSummary {
            used_gas: evm.used_gas,
            return_data: evm.return_data,
            reverted: evm.reverted,
            evm_error: evm.evm_error,
        });
        Ok(RunOutcome { result, logs: view.take_logs(), contract_address, trace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cmd {
        Cmd::try_parse_from(std::iter::once("run").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_call_returns_contract_output() {
        // PUSH1 0x2a PUSH0 MSTORE PUSH1 0x20 PUSH0 RETURN
        let outcome = parse(&["602a5f5260205ff3", "--trace"]).execute().unwrap();

        assert!(outcome.result.is_success());
        assert_eq!(outcome.result.output().unwrap(), &U256::from(42).to_be_bytes_vec());
        let trace = outcome.trace.unwrap();
        assert!(!trace.reverted);
        assert!(trace.used_gas > 0);
    }

    #[test]
    fn test_create_reports_contract_address() {
        // deploys an empty contract
        let outcome = parse(&["--create", "0x5f5ff3"]).execute().unwrap();

        assert!(outcome.result.is_success());
        let sender: Address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap();
        assert_eq!(outcome.contract_address, Some(sender.create(0)));
        assert!(outcome.trace.is_none());
    }

    #[rstest]
    #[case::reverting_contract(&["0x5f5ffd"], false, true)]
    #[case::plain_transfer(&["--value", "5"], true, true)]
    #[case::gas_below_intrinsic(&["--gas", "20000"], false, false)]
    fn test_outcome_classification(
        #[case] args: &[&str],
        #[case] success: bool,
        #[case] valid: bool,
    ) {
        let outcome = parse(args).execute().unwrap();
        assert_eq!(outcome.result.is_success(), success);
        assert_eq!(outcome.result.is_valid(), valid);
    }

    #[test]
    fn test_create_without_code_is_rejected() {
        assert!(matches!(parse(&["--create"]).execute(), Err(EvmeError::InvalidInput(_))));
    }

    #[test]
    fn test_config_enables_native_contracts() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{
                "chainId": 7,
                "sidechainId": "0x00000000000000000000000000000000000000000000000000000000000000aa",
                "sc2sc": { "canSendMessages": true }
            }"#,
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        // isRedeemed is not part of the send contract
        let outcome = parse(&[
            "--config",
            path,
            "--to",
            "0x0000000000000000000055555555555555555555",
            "--input",
            "0xdeadbeef",
        ])
        .execute()
        .unwrap();

        assert!(outcome.result.is_valid());
        assert!(matches!(outcome.result.error(), Some(sc_evm::ExecutionError::Reverted(_))));
    }

    #[test]
    fn test_outcome_serializes_to_json() {
        let outcome = parse(&["--value", "1"]).execute().unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["result"]["status"], "succeeded");
        assert_eq!(json["result"]["gasUsed"], "0x5208");
        assert!(json.get("contractAddress").is_none());
    }
}
