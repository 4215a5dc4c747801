//! Capability resolution and ticket access rules.

pub mod capability;
pub mod guard;

pub use capability::{
    default_strategies, AuthorizationResolver, CapabilityOverrides, CapabilityStrategy,
    ClaimSource, Matching, DEFAULT_TECHNICIAN_CAPABILITY, LEGACY_ROLE_CLAIM, ROLE_CLAIM,
};
pub use guard::{normalize_attachment_path, AttachmentPath, TicketAccessGuard, UPLOADS_SEGMENT};
