//! Password recovery with short numeric codes.
//!
//! A code is stored on the credential row and mailed to the user. It stays
//! valid until it is used or replaced; there is no expiry.

pub mod code;
pub mod service;

pub use code::{generate_code, DEFAULT_CODE_LEN, MIN_CODE_LEN};
pub use service::{PasswordReset, RecoveryService};
