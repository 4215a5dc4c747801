//! In-process credential store used by tests and local tooling.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::models::{CreateOutcome, NewCredential, Profile};
use super::store::{CredentialStore, StoreResult};
use super::utils::normalize_email;
use crate::error::StoreError;

#[derive(Clone, Debug)]
struct Record {
    email: String,
    password: String,
    display_name: Option<String>,
    recovery_code: Option<String>,
    capability_tag: Option<String>,
}

/// Credential store kept in a map keyed by normalized email.
///
/// Reads and writes can be made to fail on demand to exercise outage paths,
/// and password writes are counted.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, Record>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    password_writes: AtomicUsize,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a credential with a raw password representation.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn insert(
        &self,
        email: &str,
        password_representation: &str,
        display_name: Option<&str>,
        capability_tag: Option<&str>,
    ) -> StoreResult<()> {
        self.write()?.insert(
            normalize_email(email),
            Record {
                email: email.trim().to_string(),
                password: password_representation.to_string(),
                display_name: display_name.map(ToString::to_string),
                recovery_code: None,
                capability_tag: capability_tag.map(ToString::to_string),
            },
        );
        Ok(())
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful password rewrites (migration or reset).
    #[must_use]
    pub fn password_writes(&self) -> usize {
        self.password_writes.load(Ordering::SeqCst)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<String, Record>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("credential map poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<String, Record>>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("credential map poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_password_representation(&self, email: &str) -> StoreResult<Option<String>> {
        Ok(self
            .read()?
            .get(&normalize_email(email))
            .map(|record| record.password.clone()))
    }

    async fn get_profile(&self, email: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .read()?
            .get(&normalize_email(email))
            .map(|record| Profile {
                email: record.email.clone(),
                display_name: record.display_name.clone(),
                capability_tag: record.capability_tag.clone(),
            }))
    }

    async fn update_password_representation(&self, email: &str, value: &str) -> StoreResult<bool> {
        let mut records = self.write()?;
        let Some(record) = records.get_mut(&normalize_email(email)) else {
            return Ok(false);
        };
        record.password = value.to_string();
        self.password_writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn update_recovery_code(&self, email: &str, code: Option<&str>) -> StoreResult<bool> {
        let mut records = self.write()?;
        let Some(record) = records.get_mut(&normalize_email(email)) else {
            return Ok(false);
        };
        record.recovery_code = code.map(ToString::to_string);
        Ok(true)
    }

    async fn get_recovery_code(&self, email: &str) -> StoreResult<Option<String>> {
        Ok(self
            .read()?
            .get(&normalize_email(email))
            .and_then(|record| record.recovery_code.clone()))
    }

    async fn reset_password(&self, email: &str, password_hash: &str) -> StoreResult<bool> {
        let mut records = self.write()?;
        let Some(record) = records.get_mut(&normalize_email(email)) else {
            return Ok(false);
        };
        record.password = password_hash.to_string();
        record.recovery_code = None;
        self.password_writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(&normalize_email(email)))
    }

    async fn create(&self, credential: &NewCredential) -> StoreResult<CreateOutcome> {
        let key = normalize_email(&credential.email);
        let mut records = self.write()?;
        if records.contains_key(&key) {
            return Ok(CreateOutcome::Conflict);
        }
        records.insert(
            key,
            Record {
                email: credential.email.trim().to_string(),
                password: credential.password_hash.clone(),
                display_name: Some(credential.display_name.clone()),
                recovery_code: None,
                capability_tag: None,
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
