use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::authz::TicketAccessGuard;
use crate::tickets::TicketStore;

pub const DEFAULT_UPLOADS_ROOT: &str = "wwwroot";

pub struct TicketState {
    guard: TicketAccessGuard,
    tickets: Arc<dyn TicketStore>,
    uploads_root: PathBuf,
}

impl TicketState {
    #[must_use]
    pub fn new(guard: TicketAccessGuard, tickets: Arc<dyn TicketStore>) -> Self {
        Self {
            guard,
            tickets,
            uploads_root: PathBuf::from(DEFAULT_UPLOADS_ROOT),
        }
    }

    /// Directory that contains the `uploads/` folder.
    #[must_use]
    pub fn with_uploads_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.uploads_root = root.into();
        self
    }

    #[must_use]
    pub fn guard(&self) -> &TicketAccessGuard {
        &self.guard
    }

    #[must_use]
    pub fn tickets(&self) -> &dyn TicketStore {
        self.tickets.as_ref()
    }

    #[must_use]
    pub fn uploads_root(&self) -> &Path {
        &self.uploads_root
    }
}
