//! In-process ticket store used by tests and local tooling.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use super::models::{NewTicket, Ticket, STATUS_ANSWERED, STATUS_OPEN};
use super::store::TicketStore;
use crate::credentials::StoreResult;
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryTicketStore {
    tickets: RwLock<Vec<Ticket>>,
    fail: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryTicketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of list/get calls served so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Vec<Ticket>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ticket store disabled".to_string()));
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.tickets
            .read()
            .map_err(|_| StoreError::Unavailable("ticket list poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Vec<Ticket>>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ticket store disabled".to_string()));
        }
        self.tickets
            .write()
            .map_err(|_| StoreError::Unavailable("ticket list poisoned".to_string()))
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

fn newest_first(mut tickets: Vec<Ticket>) -> Vec<Ticket> {
    tickets.sort_by(|a, b| b.opened_at.cmp(&a.opened_at).then(b.id.cmp(&a.id)));
    tickets
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn list_all(&self) -> StoreResult<Vec<Ticket>> {
        Ok(newest_first(self.read()?.clone()))
    }

    async fn list_by_owner(&self, email: &str) -> StoreResult<Vec<Ticket>> {
        let owner = email.trim();
        let owned = self
            .read()?
            .iter()
            .filter(|ticket| ticket.email.trim().eq_ignore_ascii_case(owner))
            .cloned()
            .collect();
        Ok(newest_first(owned))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Ticket>> {
        Ok(self.read()?.iter().find(|ticket| ticket.id == id).cloned())
    }

    async fn create(&self, ticket: &NewTicket) -> StoreResult<Ticket> {
        let mut tickets = self.write()?;
        let id = tickets.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let created = Ticket {
            id,
            requester_name: ticket.requester_name.clone(),
            email: ticket.email.clone(),
            phone: ticket.phone.clone(),
            urgency: ticket.urgency.clone(),
            description: ticket.description.clone(),
            opened_at: now_unix(),
            status: STATUS_OPEN.to_string(),
            technician_response: None,
            attachment: ticket.attachment.clone(),
        };
        tickets.push(created.clone());
        Ok(created)
    }

    async fn respond(&self, id: i64, response: &str) -> StoreResult<bool> {
        let mut tickets = self.write()?;
        let Some(ticket) = tickets.iter_mut().find(|ticket| ticket.id == id) else {
            return Ok(false);
        };
        ticket.technician_response = Some(response.to_string());
        ticket.status = STATUS_ANSWERED.to_string();
        Ok(true)
    }

    async fn update_status(&self, id: i64, status: &str) -> StoreResult<bool> {
        let mut tickets = self.write()?;
        let Some(ticket) = tickets.iter_mut().find(|ticket| ticket.id == id) else {
            return Ok(false);
        };
        ticket.status = status.to_string();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn new_ticket(email: &str) -> NewTicket {
        NewTicket {
            requester_name: "Ana".to_string(),
            email: email.to_string(),
            description: "printer on fire".to_string(),
            ..NewTicket::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_ids_and_open_status() -> Result<()> {
        let store = MemoryTicketStore::new();
        let first = store.create(&new_ticket("a@x.com")).await?;
        let second = store.create(&new_ticket("b@x.com")).await?;
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.status, STATUS_OPEN);
        assert!(first.opened_at > 0);
        Ok(())
    }

    #[tokio::test]
    async fn lists_are_newest_first_and_filtered_by_owner() -> Result<()> {
        let store = MemoryTicketStore::new();
        store.create(&new_ticket("a@x.com")).await?;
        store.create(&new_ticket("b@x.com")).await?;
        store.create(&new_ticket("A@X.com")).await?;

        let ids: Vec<i64> = store.list_all().await?.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let owned: Vec<i64> = store
            .list_by_owner(" a@x.COM ")
            .await?
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(owned, vec![3, 1]);
        Ok(())
    }

    #[tokio::test]
    async fn respond_marks_answered() -> Result<()> {
        let store = MemoryTicketStore::new();
        let ticket = store.create(&new_ticket("a@x.com")).await?;
        assert!(store.respond(ticket.id, "turned it off and on").await?);
        let ticket = store.get(ticket.id).await?;
        assert_eq!(ticket.as_ref().map(|t| t.status.as_str()), Some(STATUS_ANSWERED));
        assert!(!store.respond(99, "nope").await?);
        assert!(!store.update_status(99, "Fechado").await?);
        Ok(())
    }
}
