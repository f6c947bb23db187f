//! In-process collaborators for tests and the terminal client.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::auth::{AuthBridge, AuthError, Identity, IdentityCallback};
use crate::catalog::{validate_catalog, CatalogError, CatalogSource};
use crate::puzzle::Puzzle;
use crate::record::{SessionRecord, UserDocument};
use crate::rules::GameRules;
use crate::store::{LocalStore, RemoteStore, StoreError};

#[derive(Clone, Default)]
pub struct MemoryLocalStore {
    slot: Rc<RefCell<Option<SessionRecord>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<SessionRecord> {
        self.slot.borrow().clone()
    }

    pub fn set_snapshot(&self, record: Option<SessionRecord>) {
        *self.slot.borrow_mut() = record;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl LocalStore for MemoryLocalStore {
    async fn read(&self) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.slot.borrow().clone())
    }

    async fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable("local writes disabled".to_string()));
        }
        *self.slot.borrow_mut() = Some(record.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.slot.borrow_mut().take();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryRemoteStore {
    documents: Rc<RefCell<HashMap<Identity, UserDocument>>>,
    fail_writes: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, identity: &Identity) -> Option<UserDocument> {
        self.documents.borrow().get(identity).cloned()
    }

    pub fn insert_document(&self, identity: Identity, document: UserDocument) {
        self.documents.borrow_mut().insert(identity, document);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl RemoteStore for MemoryRemoteStore {
    async fn read_document(&self, identity: &Identity) -> Result<Option<UserDocument>, StoreError> {
        Ok(self.documents.borrow().get(identity).cloned())
    }

    async fn merge_document(
        &self,
        identity: &Identity,
        patch: UserDocument,
    ) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Backend("remote writes disabled".to_string()));
        }
        self.writes.set(self.writes.get() + 1);
        self.documents
            .borrow_mut()
            .entry(identity.clone())
            .or_default()
            .merge(patch);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryAuth {
    accounts: Rc<RefCell<HashMap<String, (String, Identity)>>>,
    current: Rc<RefCell<Option<Identity>>>,
    listeners: Rc<RefCell<Vec<IdentityCallback>>>,
    next_id: Rc<Cell<u64>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn register(&self, email: &str, password: &str) -> Identity {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let identity = Identity::new(format!("user-{id}"));
        self.accounts.borrow_mut().insert(
            email.trim().to_ascii_lowercase(),
            (password.to_string(), identity.clone()),
        );
        identity
    }

    fn set_current(&self, identity: Option<Identity>) {
        *self.current.borrow_mut() = identity.clone();
        let listeners: Vec<IdentityCallback> = self.listeners.borrow().iter().cloned().collect();
        for listener in listeners {
            listener(identity.clone());
        }
    }
}

impl AuthBridge for MemoryAuth {
    async fn check_identity_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self
            .accounts
            .borrow()
            .contains_key(&email.trim().to_ascii_lowercase()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let account = self
            .accounts
            .borrow()
            .get(&email.trim().to_ascii_lowercase())
            .cloned();
        let Some((stored, identity)) = account else {
            return Err(AuthError::UnknownIdentity);
        };
        if stored != password {
            return Err(AuthError::WrongCredential);
        }
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if self.check_identity_exists(email).await? {
            return Err(AuthError::EmailInUse);
        }
        let identity = self.register(email, password);
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    fn on_identity_change(&self, callback: IdentityCallback) {
        self.listeners.borrow_mut().push(callback.clone());
        callback(self.current());
    }
}

/// Fixed puzzle list, or a forced fetch failure.
#[derive(Clone)]
pub struct StaticCatalog {
    puzzles: Result<Vec<Puzzle>, String>,
    rules: GameRules,
}

impl StaticCatalog {
    pub fn new(puzzles: Vec<Puzzle>) -> Self {
        Self {
            puzzles: Ok(puzzles),
            rules: GameRules::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            puzzles: Err(message.to_string()),
            rules: GameRules::default(),
        }
    }
}

impl CatalogSource for StaticCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<Puzzle>, CatalogError> {
        match &self.puzzles {
            Ok(puzzles) => validate_catalog(puzzles.clone(), &self.rules),
            Err(message) => Err(CatalogError::Fetch(message.clone())),
        }
    }
}
