//! Credential Storage
//!
//! Store for issued access tokens, refresh tokens and authorization codes,
//! keyed by token signature. Operations that read and then write (`take`,
//! `mark_used`) run as one atomic step.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;
use crate::types::{Credential, CredentialKind};

/// Outcome of marking an authorization code as used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkUsed {
    /// The code was unused and is now marked.
    Marked,
    /// The code had already been used. Every credential derived from it has
    /// been revoked.
    Replayed { revoked: usize },
    /// No such code.
    NotFound,
}

/// Credential storage interface.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a credential under its token signature.
    async fn put(
        &self,
        kind: CredentialKind,
        signature: &str,
        credential: Credential,
    ) -> Result<(), StorageError>;

    /// Retrieve a credential. Expired entries are returned as stored.
    async fn get(
        &self,
        kind: CredentialKind,
        signature: &str,
    ) -> Result<Option<Credential>, StorageError>;

    /// Delete a credential.
    async fn delete(&self, kind: CredentialKind, signature: &str) -> Result<bool, StorageError>;

    /// Remove a credential and return it, atomically.
    async fn take(
        &self,
        kind: CredentialKind,
        signature: &str,
    ) -> Result<Option<Credential>, StorageError>;

    /// Mark an authorization code as used, atomically. Marking a code that
    /// is already used revokes the credentials derived from it.
    async fn mark_used(&self, code_signature: &str) -> Result<MarkUsed, StorageError>;

    /// Delete every access and refresh token derived from a code.
    async fn revoke_derived(&self, code_signature: &str) -> Result<usize, StorageError>;

    /// Remove expired credentials.
    async fn clear_expired(&self) -> Result<usize, StorageError>;
}

#[derive(Default)]
struct Tables {
    access_tokens: HashMap<String, Credential>,
    refresh_tokens: HashMap<String, Credential>,
    authorization_codes: HashMap<String, Credential>,
}

impl Tables {
    fn table(&self, kind: CredentialKind) -> &HashMap<String, Credential> {
        match kind {
            CredentialKind::AccessToken => &self.access_tokens,
            CredentialKind::RefreshToken => &self.refresh_tokens,
            CredentialKind::AuthorizationCode => &self.authorization_codes,
        }
    }

    fn table_mut(&mut self, kind: CredentialKind) -> &mut HashMap<String, Credential> {
        match kind {
            CredentialKind::AccessToken => &mut self.access_tokens,
            CredentialKind::RefreshToken => &mut self.refresh_tokens,
            CredentialKind::AuthorizationCode => &mut self.authorization_codes,
        }
    }

    fn revoke_derived(&mut self, code_signature: &str) -> usize {
        let before = self.access_tokens.len() + self.refresh_tokens.len();
        let keep =
            |_: &String, c: &mut Credential| c.parent_code.as_deref() != Some(code_signature);

        self.access_tokens.retain(keep);
        self.refresh_tokens.retain(keep);

        before - (self.access_tokens.len() + self.refresh_tokens.len())
    }

    fn mark_used(&mut self, code_signature: &str) -> MarkUsed {
        let already_used = match self.authorization_codes.get_mut(code_signature) {
            Some(code) => std::mem::replace(&mut code.used, true),
            None => return MarkUsed::NotFound,
        };

        if already_used {
            MarkUsed::Replayed {
                revoked: self.revoke_derived(code_signature),
            }
        } else {
            MarkUsed::Marked
        }
    }

    fn clear_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.len();

        self.access_tokens.retain(|_, c| !c.is_expired_at(now));
        self.refresh_tokens.retain(|_, c| !c.is_expired_at(now));
        self.authorization_codes.retain(|_, c| !c.is_expired_at(now));

        before - self.len()
    }

    fn len(&self) -> usize {
        self.access_tokens.len() + self.refresh_tokens.len() + self.authorization_codes.len()
    }
}

/// In-memory credential store.
pub struct InMemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl InMemoryCredentialStore {
    /// Create new in-memory credential store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Number of stored credentials of a kind.
    pub fn count(&self, kind: CredentialKind) -> Result<usize, StorageError> {
        Ok(self.lock()?.table(kind).len())
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn put(
        &self,
        kind: CredentialKind,
        signature: &str,
        credential: Credential,
    ) -> Result<(), StorageError> {
        self.lock()?
            .table_mut(kind)
            .insert(signature.to_string(), credential);
        Ok(())
    }

    async fn get(
        &self,
        kind: CredentialKind,
        signature: &str,
    ) -> Result<Option<Credential>, StorageError> {
        Ok(self.lock()?.table(kind).get(signature).cloned())
    }

    async fn delete(&self, kind: CredentialKind, signature: &str) -> Result<bool, StorageError> {
        Ok(self.lock()?.table_mut(kind).remove(signature).is_some())
    }

    async fn take(
        &self,
        kind: CredentialKind,
        signature: &str,
    ) -> Result<Option<Credential>, StorageError> {
        Ok(self.lock()?.table_mut(kind).remove(signature))
    }

    async fn mark_used(&self, code_signature: &str) -> Result<MarkUsed, StorageError> {
        Ok(self.lock()?.mark_used(code_signature))
    }

    async fn revoke_derived(&self, code_signature: &str) -> Result<usize, StorageError> {
        Ok(self.lock()?.revoke_derived(code_signature))
    }

    async fn clear_expired(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.clear_expired())
    }
}

/// Mock credential store for testing.
///
/// Behaves like [`InMemoryCredentialStore`] and records calls. Failures can
/// be injected for all operations, for the next operation only, or for
/// writes of a single credential kind.
#[derive(Default)]
pub struct MockCredentialStore {
    inner: InMemoryCredentialStore,
    put_history: Mutex<Vec<(CredentialKind, String)>>,
    get_history: Mutex<Vec<(CredentialKind, String)>>,
    delete_history: Mutex<Vec<(CredentialKind, String)>>,
    next_error: Mutex<Option<StorageError>>,
    should_fail: Mutex<bool>,
    fail_put_of: Mutex<Option<CredentialKind>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockCredentialStore {
    /// Create new mock credential store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set next error to return.
    pub fn set_next_error(&self, error: StorageError) -> &Self {
        *lock(&self.next_error) = Some(error);
        self
    }

    /// Set storage to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *lock(&self.should_fail) = should_fail;
        self
    }

    /// Fail every `put` of the given kind.
    pub fn set_fail_put_of(&self, kind: Option<CredentialKind>) -> &Self {
        *lock(&self.fail_put_of) = kind;
        self
    }

    /// Pre-populate a credential.
    pub async fn add_credential(
        &self,
        kind: CredentialKind,
        signature: &str,
        credential: Credential,
    ) -> Result<(), StorageError> {
        self.inner.put(kind, signature, credential).await
    }

    /// Number of stored credentials of a kind.
    pub fn count(&self, kind: CredentialKind) -> Result<usize, StorageError> {
        self.inner.count(kind)
    }

    /// Get put history.
    pub fn get_put_history(&self) -> Vec<(CredentialKind, String)> {
        lock(&self.put_history).clone()
    }

    /// Get lookup history.
    pub fn get_get_history(&self) -> Vec<(CredentialKind, String)> {
        lock(&self.get_history).clone()
    }

    /// Get delete history.
    pub fn get_delete_history(&self) -> Vec<(CredentialKind, String)> {
        lock(&self.delete_history).clone()
    }

    fn check_error(&self) -> Result<(), StorageError> {
        if *lock(&self.should_fail) {
            return Err(StorageError::Unavailable {
                message: "Mock storage failure".to_string(),
            });
        }

        if let Some(error) = lock(&self.next_error).take() {
            return Err(error);
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn put(
        &self,
        kind: CredentialKind,
        signature: &str,
        credential: Credential,
    ) -> Result<(), StorageError> {
        self.check_error()?;
        if *lock(&self.fail_put_of) == Some(kind) {
            return Err(StorageError::WriteFailed {
                message: format!("Mock {} write failure", kind),
            });
        }

        lock(&self.put_history).push((kind, signature.to_string()));
        self.inner.put(kind, signature, credential).await
    }

    async fn get(
        &self,
        kind: CredentialKind,
        signature: &str,
    ) -> Result<Option<Credential>, StorageError> {
        self.check_error()?;
        lock(&self.get_history).push((kind, signature.to_string()));
        self.inner.get(kind, signature).await
    }

    async fn delete(&self, kind: CredentialKind, signature: &str) -> Result<bool, StorageError> {
        self.check_error()?;
        lock(&self.delete_history).push((kind, signature.to_string()));
        self.inner.delete(kind, signature).await
    }

    async fn take(
        &self,
        kind: CredentialKind,
        signature: &str,
    ) -> Result<Option<Credential>, StorageError> {
        self.check_error()?;
        lock(&self.delete_history).push((kind, signature.to_string()));
        self.inner.take(kind, signature).await
    }

    async fn mark_used(&self, code_signature: &str) -> Result<MarkUsed, StorageError> {
        self.check_error()?;
        self.inner.mark_used(code_signature).await
    }

    async fn revoke_derived(&self, code_signature: &str) -> Result<usize, StorageError> {
        self.check_error()?;
        self.inner.revoke_derived(code_signature).await
    }

    async fn clear_expired(&self) -> Result<usize, StorageError> {
        self.check_error()?;
        self.inner.clear_expired().await
    }
}

/// Create in-memory credential store.
pub fn create_in_memory_credential_store() -> InMemoryCredentialStore {
    InMemoryCredentialStore::new()
}

/// Create mock credential store for testing.
pub fn create_mock_credential_store() -> MockCredentialStore {
    MockCredentialStore::new()
}
