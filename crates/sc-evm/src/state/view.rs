use std::collections::BTreeSet;

use alloy_primitives::{Address, Bytes, Log, B256, U256};
use revm::primitives::{StorageKey, StorageValue};

use super::{db::JournalCheckpoint, StateDb};
use crate::InitializationError;

/// The error returned when an account cannot pay a transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("insufficient balance for {address}: have {balance}, want {amount}")]
pub struct InsufficientBalance {
    /// The account being debited.
    pub address: Address,
    /// Its balance.
    pub balance: U256,
    /// The requested amount.
    pub amount: U256,
}

/// Identifies a snapshot taken with [`AccountStateView::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotId(usize);

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    journal: JournalCheckpoint,
    native_contracts: usize,
    logs: usize,
}

/// The mutable view of account and contract state that messages are applied to.
///
/// The view owns its [`StateDb`]. It is handed to the EVM by mutable borrow for the duration of a
/// single call and released when the view is dropped or [`closed`](Self::close).
#[derive(Debug, Default)]
pub struct AccountStateView {
    db: StateDb,
    native_contracts: BTreeSet<Address>,
    // registration order, for reverting to a snapshot
    native_contract_log: Vec<Address>,
    logs: Vec<Log>,
    snapshots: Vec<Snapshot>,
}

impl AccountStateView {
    /// Creates a view over `db`.
    pub fn new(db: StateDb) -> Self {
        Self { db, ..Default::default() }
    }

    /// Releases the view, returning the underlying store.
    pub fn close(self) -> StateDb {
        tracing::trace!(logs = self.logs.len(), "closing account state view");
        self.db
    }

    /// Returns the underlying store.
    pub const fn state_db(&self) -> &StateDb {
        &self.db
    }

    /// Returns the underlying store mutably, for the EVM to execute against.
    pub fn state_db_mut(&mut self) -> &mut StateDb {
        &mut self.db
    }

    /// Returns whether an account exists at `address`.
    pub fn account_exists(&self, address: Address) -> bool {
        self.db.account(address).is_some()
    }

    /// Returns whether the account at `address` carries EVM code.
    pub fn is_smart_contract_account(&self, address: Address) -> bool {
        self.db.account(address).is_some_and(|info| !info.is_empty_code_hash())
    }

    /// Returns whether `address` is the reserved account of a native contract.
    pub fn is_native_contract_account(&self, address: Address) -> bool {
        self.native_contracts.contains(&address)
    }

    /// Materializes the reserved account of a native contract.
    pub fn add_native_contract_account(
        &mut self,
        address: Address,
    ) -> Result<(), InitializationError> {
        if self.account_exists(address) || self.is_native_contract_account(address) {
            return Err(InitializationError::AccountAlreadyExists(address));
        }
        // a non-zero nonce keeps the account from being pruned as empty
        self.db.set_nonce(address, 1);
        self.native_contracts.insert(address);
        if !self.snapshots.is_empty() {
            self.native_contract_log.push(address);
        }
        tracing::debug!(%address, "native contract account created");
        Ok(())
    }

    /// Returns the balance of `address`.
    pub fn balance(&self, address: Address) -> U256 {
        self.db.account(address).map(|info| info.balance).unwrap_or_default()
    }

    /// Returns the nonce of `address`.
    pub fn nonce(&self, address: Address) -> u64 {
        self.db.account(address).map(|info| info.nonce).unwrap_or_default()
    }

    /// Returns the code of `address`.
    pub fn code(&self, address: Address) -> Bytes {
        self.db.code(address)
    }

    /// Sets the balance of `address`.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.db.set_balance(address, balance);
    }

    /// Credits `amount` to `address`.
    pub fn add_balance(&mut self, address: Address, amount: U256) {
        let balance = self.balance(address).saturating_add(amount);
        self.db.set_balance(address, balance);
    }

    /// Debits `amount` from `address`.
    pub fn sub_balance(
        &mut self,
        address: Address,
        amount: U256,
    ) -> Result<(), InsufficientBalance> {
        let balance = self.balance(address);
        if balance < amount {
            return Err(InsufficientBalance { address, balance, amount });
        }
        self.db.set_balance(address, balance - amount);
        Ok(())
    }

    /// Increments the nonce of `address`.
    pub fn increase_nonce(&mut self, address: Address) {
        let nonce = self.nonce(address);
        self.db.set_nonce(address, nonce.saturating_add(1));
    }

    /// Deploys `code` at `address`.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.db.set_code(address, code);
    }

    /// Reads a storage slot of `address`.
    pub fn storage_at(&self, address: Address, key: StorageKey) -> StorageValue {
        self.db.storage_at(address, key)
    }

    /// Writes a storage slot of `address`.
    pub fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.db.set_storage(address, key, value);
    }

    /// Reads a storage slot addressed by a 32-byte key.
    pub fn storage_by_hash(&self, address: Address, key: B256) -> StorageValue {
        self.storage_at(address, U256::from_be_bytes(key.0))
    }

    /// Appends a log emitted by the current message.
    pub fn add_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Returns the logs emitted so far.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Drains the logs emitted so far.
    pub fn take_logs(&mut self) -> Vec<Log> {
        core::mem::take(&mut self.logs)
    }

    /// Records the current state so that it can be restored with
    /// [`revert_to_snapshot`](Self::revert_to_snapshot).
    ///
    /// Taking a snapshot is cheap: from then on every change is journaled, and reverting undoes
    /// the journaled changes.
    pub fn snapshot(&mut self) -> SnapshotId {
        self.snapshots.push(Snapshot {
            journal: self.db.checkpoint(),
            native_contracts: self.native_contract_log.len(),
            logs: self.logs.len(),
        });
        SnapshotId(self.snapshots.len() - 1)
    }

    /// Restores the state recorded by `id`, discarding it and every later snapshot.
    ///
    /// Unknown ids are ignored.
    pub fn revert_to_snapshot(&mut self, id: SnapshotId) {
        let Some(&snapshot) = self.snapshots.get(id.0) else { return };
        self.snapshots.truncate(id.0);
        self.db.revert_journal(snapshot.journal);
        for address in self.native_contract_log.drain(snapshot.native_contracts..) {
            self.native_contracts.remove(&address);
        }
        self.logs.truncate(snapshot.logs);
        self.release_journal();
    }

    /// Discards the snapshot recorded by `id` and every later one, keeping the current state.
    pub fn discard_snapshot(&mut self, id: SnapshotId) {
        self.snapshots.truncate(id.0);
        self.release_journal();
    }

    fn release_journal(&mut self) {
        if self.snapshots.is_empty() {
            self.db.clear_journal();
            self.native_contract_log.clear();
        }
    }
}
