use core::convert::Infallible;

use alloy_primitives::{Address, Bytes, B256, U256};
use delegate::delegate;
use revm::{
    database::{AccountState, CacheDB, EmptyDB},
    primitives::{HashMap, StorageKey, StorageValue},
    state::{Account, AccountInfo, Bytecode},
};

/// A change to the store, recorded with what it overwrote.
#[derive(Debug, Clone)]
enum JournalEntry {
    /// The account was not cached before.
    AccountLoaded { address: Address },
    /// The account info and status before a change.
    AccountChanged { address: Address, info: AccountInfo, account_state: AccountState },
    /// A storage slot before a write. `None` if the slot was unset.
    StorageChanged { address: Address, key: StorageKey, previous: Option<StorageValue> },
    /// The storage of an account before it was wiped by creation or self-destruction.
    StorageCleared { address: Address, storage: HashMap<StorageKey, StorageValue> },
}

/// Position in the change journal of a [`StateDb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct JournalCheckpoint(usize);

/// The in-memory account store the EVM executes against.
///
/// Every read goes through the cache only; there is no backing database behind it. While journaling
/// is on, every write records the value it overwrites so that it can be undone with
/// [`revert_journal`](Self::revert_journal).
#[derive(Debug, Default, Clone, derive_more::Deref)]
pub struct StateDb {
    #[deref]
    db: CacheDB<EmptyDB>,
    journal: Vec<JournalEntry>,
    journaling: bool,
}

impl StateDb {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the account at `address`, if it exists.
    pub fn account(&self, address: Address) -> Option<&AccountInfo> {
        self.db
            .cache
            .accounts
            .get(&address)
            .filter(|account| account.account_state != AccountState::NotExisting)
            .map(|account| &account.info)
    }

    /// Returns the code of the account at `address`. Missing accounts have empty code.
    pub fn code(&self, address: Address) -> Bytes {
        let Some(info) = self.account(address) else { return Bytes::new() };
        info.code
            .as_ref()
            .or_else(|| self.db.cache.contracts.get(&info.code_hash))
            .map(|code| code.original_bytes())
            .unwrap_or_default()
    }

    /// Returns the value of a storage slot. Missing slots read as zero.
    pub fn storage_at(&self, address: Address, key: StorageKey) -> StorageValue {
        self.db
            .cache
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&key))
            .copied()
            .unwrap_or_default()
    }

    /// Sets the balance of an account, creating it if needed.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.update_info(address, |info| info.balance = balance);
    }

    /// Sets the nonce of an account, creating it if needed.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.update_info(address, |info| info.nonce = nonce);
    }

    /// Sets the code of an account, creating it if needed.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        let bytecode = Bytecode::new_legacy(code);
        let code_hash = bytecode.hash_slow();
        self.update_info(address, |info| {
            info.code = Some(bytecode);
            info.code_hash = code_hash;
        });
    }

    /// Sets a storage slot of an account, creating it if needed.
    pub fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.record_account(address);
        self.record_slot(address, key);
        let Ok(account) = self.db.load_account(address);
        account.storage.insert(key, value);
        account.account_state = AccountState::None;
    }

    fn update_info(&mut self, address: Address, f: impl FnOnce(&mut AccountInfo)) {
        self.record_account(address);
        let Ok(account) = self.db.load_account(address);
        f(&mut account.info);
        account.account_state = AccountState::None;
    }

    /// Starts recording changes, returning the current end of the journal.
    pub(crate) fn checkpoint(&mut self) -> JournalCheckpoint {
        self.journaling = true;
        JournalCheckpoint(self.journal.len())
    }

    /// Undoes every change recorded after `checkpoint`, newest first.
    pub(crate) fn revert_journal(&mut self, checkpoint: JournalCheckpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some(entry) = self.journal.pop() else { break };
            let accounts = &mut self.db.cache.accounts;
            match entry {
                JournalEntry::AccountLoaded { address } => {
                    accounts.remove(&address);
                }
                JournalEntry::AccountChanged { address, info, account_state } => {
                    if let Some(account) = accounts.get_mut(&address) {
                        account.info = info;
                        account.account_state = account_state;
                    }
                }
                JournalEntry::StorageChanged { address, key, previous } => {
                    if let Some(account) = accounts.get_mut(&address) {
                        match previous {
                            Some(value) => account.storage.insert(key, value),
                            None => account.storage.remove(&key),
                        };
                    }
                }
                JournalEntry::StorageCleared { address, storage } => {
                    if let Some(account) = accounts.get_mut(&address) {
                        account.storage = storage;
                    }
                }
            }
        }
    }

    /// Stops recording changes and forgets the recorded ones.
    pub(crate) fn clear_journal(&mut self) {
        self.journaling = false;
        self.journal.clear();
    }

    fn record_account(&mut self, address: Address) {
        if !self.journaling {
            return;
        }
        let entry = match self.db.cache.accounts.get(&address) {
            Some(account) => JournalEntry::AccountChanged {
                address,
                info: account.info.clone(),
                account_state: account.account_state.clone(),
            },
            None => JournalEntry::AccountLoaded { address },
        };
        self.journal.push(entry);
    }

    fn record_slot(&mut self, address: Address, key: StorageKey) {
        if !self.journaling {
            return;
        }
        let previous = self
            .db
            .cache
            .accounts
            .get(&address)
            .and_then(|account| account.storage.get(&key))
            .copied();
        self.journal.push(JournalEntry::StorageChanged { address, key, previous });
    }

    fn record_commit(&mut self, changes: &HashMap<Address, Account>) {
        for (&address, account) in changes.iter().filter(|(_, account)| account.is_touched()) {
            self.record_account(address);
            if account.is_selfdestructed() || account.is_created() {
                let storage = self
                    .db
                    .cache
                    .accounts
                    .get(&address)
                    .map(|account| account.storage.clone())
                    .unwrap_or_default();
                self.journal.push(JournalEntry::StorageCleared { address, storage });
            }
            if account.is_selfdestructed() {
                continue;
            }
            for &key in account.storage.keys() {
                self.record_slot(address, key);
            }
        }
    }
}

impl revm::Database for StateDb {
    type Error = Infallible;

    delegate! {
        to self.db {
            fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;
            fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;
            fn storage(&mut self, address: Address, index: StorageKey) -> Result<StorageValue, Self::Error>;
            fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error>;
        }
    }
}

impl revm::DatabaseCommit for StateDb {
    fn commit(&mut self, changes: HashMap<Address, Account>) {
        if self.journaling {
            self.record_commit(&changes);
        }
        revm::DatabaseCommit::commit(&mut self.db, changes);
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use revm::{state::EvmStorageSlot, DatabaseCommit};

    use super::*;

    const ALICE: Address = address!("0x0000000000000000000000000000000000100000");
    const BOB: Address = address!("0x0000000000000000000000000000000000100001");

    fn committed(info: AccountInfo, storage: &[(u64, u64)], created: bool) -> Account {
        let mut account = Account::from(info);
        account.mark_touch();
        if created {
            account.mark_created();
        }
        for &(key, value) in storage {
            account.storage.insert(
                U256::from(key),
                EvmStorageSlot::new_changed(U256::ZERO, U256::from(value), 0),
            );
        }
        account
    }

    #[test]
    fn test_revert_journal_undoes_direct_writes() {
        let mut db = StateDb::new();
        db.set_balance(ALICE, U256::from(10));
        db.set_storage(ALICE, U256::from(1), U256::from(7));
        let checkpoint = db.checkpoint();

        db.set_balance(ALICE, U256::from(3));
        db.set_storage(ALICE, U256::from(1), U256::from(8));
        db.set_storage(ALICE, U256::from(2), U256::from(9));
        db.set_nonce(BOB, 4);
        db.revert_journal(checkpoint);

        assert_eq!(db.account(ALICE).map(|info| info.balance), Some(U256::from(10)));
        assert_eq!(db.storage_at(ALICE, U256::from(1)), U256::from(7));
        assert_eq!(db.storage_at(ALICE, U256::from(2)), U256::ZERO);
        assert!(db.account(BOB).is_none());
    }

    #[test]
    fn test_revert_journal_undoes_commits() {
        let mut db = StateDb::new();
        db.set_balance(ALICE, U256::from(10));
        db.set_storage(ALICE, U256::from(1), U256::from(7));
        let checkpoint = db.checkpoint();

        let info = AccountInfo { balance: U256::from(1), nonce: 2, ..Default::default() };
        db.commit(HashMap::from_iter([
            (ALICE, committed(info.clone(), &[(1, 5)], false)),
            (BOB, committed(info, &[(3, 6)], true)),
        ]));
        assert_eq!(db.storage_at(ALICE, U256::from(1)), U256::from(5));
        assert_eq!(db.storage_at(BOB, U256::from(3)), U256::from(6));

        db.revert_journal(checkpoint);
        assert_eq!(db.account(ALICE).map(|info| info.balance), Some(U256::from(10)));
        assert_eq!(db.storage_at(ALICE, U256::from(1)), U256::from(7));
        assert!(db.account(BOB).is_none());
    }

    #[test]
    fn test_nothing_is_recorded_without_checkpoint() {
        let mut db = StateDb::new();
        db.set_balance(ALICE, U256::from(10));
        assert!(db.journal.is_empty());

        db.checkpoint();
        db.set_balance(ALICE, U256::from(11));
        assert_eq!(db.journal.len(), 1);
        db.clear_journal();
        db.set_balance(ALICE, U256::from(12));
        assert!(db.journal.is_empty());
    }
}
