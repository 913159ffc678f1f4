use crate::domain::model::{GameMode, GameModeConfig, Ticket, WinningNumbers};
use crate::domain::ports::{PotStore, TicketStore, WinningNumberStore};
use crate::utils::error::{PoolError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory backend for tests and offline runs. Mirrors the remote
/// store's record shape: tickets keyed by a generated record id, one pot
/// document per mode, winning-number sets as an append-only history whose
/// last entry is the active one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tickets: Mutex<HashMap<GameMode, Vec<Ticket>>>,
    configs: Mutex<HashMap<GameMode, GameModeConfig>>,
    winning: Mutex<HashMap<GameMode, Vec<WinningNumbers>>>,
    next_id: AtomicI64,
    fail_upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Make the next `count` upserts fail with a store error. Lets tests
    /// exercise partial bulk-import failures.
    pub fn fail_next_upserts(&self, count: usize) {
        self.fail_upserts.store(count, Ordering::SeqCst);
    }

    pub fn ticket_count(&self, mode: GameMode) -> usize {
        self.tickets
            .lock()
            .expect("tickets lock poisoned")
            .get(&mode)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn list_tickets(&self, mode: GameMode) -> Result<Vec<Ticket>> {
        let store = self.tickets.lock().expect("tickets lock poisoned");
        let rows = store.get(&mode).cloned().unwrap_or_default();
        // Row ids are positional and reassigned on every load.
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, mut t)| {
                t.id = i as u32 + 1;
                t.hit_count = 0;
                t
            })
            .collect())
    }

    async fn upsert_ticket(&self, mode: GameMode, ticket: &Ticket) -> Result<Option<i64>> {
        if self
            .fail_upserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(PoolError::Store {
                message: "simulated upsert failure".to_string(),
            });
        }

        let mut store = self.tickets.lock().expect("tickets lock poisoned");
        let rows = store.entry(mode).or_default();

        if let Some(external_id) = ticket.external_id {
            match rows.iter_mut().find(|t| t.external_id == Some(external_id)) {
                Some(existing) => {
                    *existing = ticket.clone();
                    Ok(Some(external_id))
                }
                None => Err(PoolError::Store {
                    message: format!("no record with id {}", external_id),
                }),
            }
        } else {
            let external_id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let mut row = ticket.clone();
            row.external_id = Some(external_id);
            rows.push(row);
            Ok(Some(external_id))
        }
    }

    async fn delete_ticket(&self, mode: GameMode, external_id: i64) -> Result<()> {
        let mut store = self.tickets.lock().expect("tickets lock poisoned");
        if let Some(rows) = store.get_mut(&mode) {
            rows.retain(|t| t.external_id != Some(external_id));
        }
        Ok(())
    }

    async fn delete_all(&self, mode: GameMode) -> Result<()> {
        let mut store = self.tickets.lock().expect("tickets lock poisoned");
        store.remove(&mode);
        Ok(())
    }
}

#[async_trait]
impl PotStore for MemoryStore {
    async fn get_config(&self, mode: GameMode) -> Result<Option<GameModeConfig>> {
        let configs = self.configs.lock().expect("configs lock poisoned");
        Ok(configs.get(&mode).cloned())
    }

    async fn set_config(&self, mode: GameMode, config: &GameModeConfig) -> Result<()> {
        let mut configs = self.configs.lock().expect("configs lock poisoned");
        configs.insert(mode, config.clone());
        Ok(())
    }
}

#[async_trait]
impl WinningNumberStore for MemoryStore {
    async fn get_latest(&self, mode: GameMode) -> Result<Option<WinningNumbers>> {
        let winning = self.winning.lock().expect("winning lock poisoned");
        Ok(winning.get(&mode).and_then(|sets| sets.last().cloned()))
    }

    async fn replace(&self, mode: GameMode, numbers: &WinningNumbers) -> Result<()> {
        let mut winning = self.winning.lock().expect("winning lock poisoned");
        let sets = winning.entry(mode).or_default();
        sets.pop();
        if !numbers.is_empty() {
            sets.push(numbers.clone());
        }
        Ok(())
    }
}
