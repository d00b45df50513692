//! Bytecode fixtures.

use alloy_primitives::{hex, Bytes, U256};
use alloy_sol_types::sol;
use revm::bytecode::opcode::{
    CODECOPY, DUP1, JUMP, JUMPDEST, MSTORE, PUSH0, PUSH1, PUSH2, RETURN, REVERT, SSTORE,
};

sol! {
    /// The interface of the Storage contract.
    interface IStorage {
        function retrieve() external view returns (uint256);
        function inc() external;
        function store(uint256 value) external;
    }
}

/// Deployment code of the Storage contract.
///
/// The constructor takes one `uint256`, stores it in slot `0` and emits three logs. The deployed
/// contract exposes [`IStorage`].
pub const STORAGE_CONTRACT_DEPLOY_CODE: &[u8] = &hex!(
    "608060405234801561001057600080fd5b5060405161023638038061023683398101604081905261002f916100f6565b6000819055604051339060008051602061021683398151915290610073906020808252600c908201526b48656c6c6f20576f726c642160a01b604082015260600190565b60405180910390a2336001600160a01b03166000805160206102168339815191526040516100bf906020808252600a908201526948656c6c6f2045564d2160b01b604082015260600190565b60405180910390a26040517ffe1a3ad11e425db4b8e6af35d11c50118826a496df73006fc724cb27f2b9994690600090a15061010f565b60006020828403121561010857600080fd5b5051919050565b60f98061011d6000396000f3fe60806040526004361060305760003560e01c80632e64cec1146035578063371303c01460565780636057361d14606a575b600080fd5b348015604057600080fd5b5060005460405190815260200160405180910390f35b348015606157600080fd5b506068607a565b005b606860753660046086565b600055565b6000546075906001609e565b600060208284031215609757600080fd5b5035919050565b6000821982111560be57634e487b7160e01b600052601160045260246000fd5b50019056fea264697066735822122080d9db531d29b1bd6b4e16762726b70e2a94f0b40ee4e2ab534d9b879cf1c25664736f6c634300080f00330738f4da267a110d810e6e89fc59e46be6de0c37b1d5cd559b267dc3688e74e0"
);

/// Returns the creation input deploying the Storage contract with `initial_value`.
pub fn storage_contract_init_code(initial_value: U256) -> Bytes {
    [STORAGE_CONTRACT_DEPLOY_CODE, &initial_value.to_be_bytes::<32>()].concat().into()
}

/// A builder for hand-assembled contract code.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: Vec<u8>,
}

impl CodeBuilder {
    /// Returns the assembled code.
    pub fn build(self) -> Bytes {
        self.code.into()
    }

    /// Appends raw opcodes.
    pub fn op(mut self, ops: impl IntoIterator<Item = u8>) -> Self {
        self.code.extend(ops);
        self
    }

    /// Pushes up to 32 bytes.
    pub fn push(mut self, bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        assert!(!bytes.is_empty() && bytes.len() <= 32);
        self.code.push(PUSH0 + bytes.len() as u8);
        self.code.extend_from_slice(bytes);
        self
    }

    /// Stores `value` in storage slot `slot`.
    pub fn sstore(self, slot: u8, value: U256) -> Self {
        self.push(value.to_be_bytes::<32>()).push([slot]).op([SSTORE])
    }

    /// Writes `data` to memory from offset `0`, padded to whole words.
    pub fn mstore(mut self, data: &[u8]) -> Self {
        for (index, chunk) in data.chunks(32).enumerate() {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            self = self.push(word).push([(index * 32) as u8]).op([MSTORE]);
        }
        self
    }

    /// Returns `data` from the call.
    pub fn return_data(self, data: &[u8]) -> Self {
        self.mstore(data).push([data.len() as u8]).op([PUSH0, RETURN])
    }

    /// Reverts the call with `data`.
    pub fn revert_data(self, data: &[u8]) -> Self {
        self.mstore(data).push([data.len() as u8]).op([PUSH0, REVERT])
    }

    /// Loops until the call runs out of gas. Must come first.
    pub fn spin(self) -> Self {
        self.op([JUMPDEST, PUSH0, JUMP])
    }
}

/// Wraps `runtime` in creation code that deploys it unchanged.
pub fn deploy_code(runtime: &[u8]) -> Bytes {
    const PREFIX_LEN: u8 = 10;
    let len = (runtime.len() as u16).to_be_bytes();
    let mut code =
        vec![PUSH2, len[0], len[1], DUP1, PUSH1, PREFIX_LEN, PUSH0, CODECOPY, PUSH0, RETURN];
    code.extend_from_slice(runtime);
    code.into()
}
