//! Credential storage, password digests and login.

pub mod hashing;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod service;
pub mod store;
pub mod utils;

pub use hashing::{hash_secret, verify_secret, LegacyPlaintext, PasswordMatch};
pub use memory::MemoryCredentialStore;
pub use models::{CreateOutcome, NewCredential, Profile};
pub use postgres::PgCredentialStore;
pub use service::{AuthenticationService, Registration, DEFAULT_USER_CAPABILITY};
pub use store::{CredentialStore, StoreResult};
