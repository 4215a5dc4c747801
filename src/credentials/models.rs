//! Credential records as seen by the services.

/// Profile fields used to build a principal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Profile {
    pub email: String,
    pub display_name: Option<String>,
    pub capability_tag: Option<String>,
}

/// Data needed to create a credential at registration.
#[derive(Clone, Debug)]
pub struct NewCredential {
    pub email: String,
    /// Already hashed; stores never see plaintext from registration.
    pub password_hash: String,
    pub display_name: String,
}

/// Outcome when attempting to create a new credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Conflict,
}
