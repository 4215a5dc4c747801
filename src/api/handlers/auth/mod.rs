//! Auth handlers and supporting modules.
//!
//! Sessions are stateless: the cookie carries the signed principal, so
//! logout only clears the cookie and a copied token stays valid until it
//! expires.

pub mod login;
pub(crate) mod principal;
pub mod recovery;
pub mod register;
pub(crate) mod session;
mod state;
pub mod token;
pub mod types;

pub use principal::{session_layer, OptionalPrincipal, RequirePrincipal};
pub use session::SESSION_COOKIE_NAME;
pub use state::{AuthConfig, AuthState, DEFAULT_SESSION_TTL_SECONDS, MIN_SESSION_SECRET_LEN};
