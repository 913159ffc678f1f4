use chrono::{Datelike, Local, Weekday};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::intents::{apply_number_edit, EditIntent, TicketDraft};
use crate::core::prize::{compute_hits, compute_prize_pool};
use crate::core::scheduler::DebouncedTask;
use crate::domain::model::{GameMode, GameModeConfig, PrizeResult, Ticket, WinningNumbers};
use crate::domain::ports::{Backend, PotStore, TicketStore, WinningNumberStore};
use crate::utils::error::{PoolError, Result};
use crate::utils::validation::validate_token;

const DEFAULT_BULK_CONCURRENCY: usize = 5;
const CONFIG_SAVE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Everything the current game mode needs in memory: the edited grid, the
/// active draw and the pot configuration. One explicit value, no ambient
/// globals.
#[derive(Debug, Clone)]
pub struct PoolState {
    pub mode: GameMode,
    pub tickets: Vec<Ticket>,
    pub winning_numbers: WinningNumbers,
    pub config: GameModeConfig,
}

impl PoolState {
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            tickets: Vec::new(),
            winning_numbers: WinningNumbers::new(),
            config: GameModeConfig::default(),
        }
    }

    fn ticket_mut(&mut self, ticket_id: u32) -> &mut Ticket {
        if let Some(idx) = self.tickets.iter().position(|t| t.id == ticket_id) {
            &mut self.tickets[idx]
        } else {
            let idx = self.tickets.len();
            self.tickets.push(Ticket::new(ticket_id, self.mode));
            &mut self.tickets[idx]
        }
    }

    fn next_row_id(&self) -> u32 {
        self.tickets.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }
}

/// Outcome of one bulk import: which rows landed in the grid, how many
/// drafts were rejected during validation and which rows failed to persist.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BulkImportReport {
    pub imported: Vec<u32>,
    pub rejected: usize,
    pub save_failures: Vec<u32>,
}

/// Owns the pool state over a backend and recomputes hits and prize
/// distribution after every relevant mutation. Store failures on the write
/// path are logged and surfaced, never rolled back: the grid may diverge
/// from the backend until the next load.
pub struct PoolEngine<S> {
    store: Arc<S>,
    pub state: PoolState,
    saving: Arc<Mutex<HashSet<u32>>>,
    config_save: DebouncedTask,
    bulk_concurrency: usize,
}

impl<S: Backend + 'static> PoolEngine<S> {
    pub fn new(store: Arc<S>, mode: GameMode) -> Self {
        Self {
            store,
            state: PoolState::new(mode),
            saving: Arc::new(Mutex::new(HashSet::new())),
            config_save: DebouncedTask::new(CONFIG_SAVE_DEBOUNCE),
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
        }
    }

    pub fn with_bulk_concurrency(mut self, limit: usize) -> Self {
        self.bulk_concurrency = limit.max(1);
        self
    }

    /// Fetch tickets, pot configuration and the active draw for the current
    /// mode. A missing pot document is created lazily with defaults.
    pub async fn load(&mut self) -> Result<PrizeResult> {
        let mode = self.state.mode;
        tracing::info!("Loading state for {}", mode);

        self.state.tickets = self.store.list_tickets(mode).await?;
        self.state.config = match self.store.get_config(mode).await? {
            Some(config) => config,
            None => {
                let config = GameModeConfig::default();
                self.store.set_config(mode, &config).await?;
                config
            }
        };
        self.state.winning_numbers = self
            .store
            .get_latest(mode)
            .await?
            .unwrap_or_default();

        tracing::info!(
            "Loaded {} tickets, {} winning numbers",
            self.state.tickets.len(),
            self.state.winning_numbers.len()
        );
        Ok(self.recompute())
    }

    /// Swap the active game and reload everything for it.
    pub async fn switch_mode(&mut self, mode: GameMode) -> Result<PrizeResult> {
        self.config_save.flush().await;
        self.state = PoolState::new(mode);
        self.load().await
    }

    /// Recompute hits and prize distribution using the caller's clock.
    pub fn recompute(&mut self) -> PrizeResult {
        self.recompute_for(Local::now().date_naive().weekday())
    }

    pub fn recompute_for(&mut self, today: Weekday) -> PrizeResult {
        compute_hits(&mut self.state.tickets, &self.state.winning_numbers);
        // Keep the derived daily-pot mirror in sync with today's value.
        self.state.config.daily_pot = self.state.config.weekday_value(today);
        compute_prize_pool(&self.state.tickets, &self.state.config, self.state.mode, today)
    }

    pub fn on_tickets_changed(&mut self) -> PrizeResult {
        self.recompute()
    }

    pub fn on_winning_numbers_changed(&mut self) -> PrizeResult {
        self.recompute()
    }

    pub fn on_config_changed(&mut self) -> PrizeResult {
        self.recompute()
    }

    /// Apply one grid edit. Edits that fail validation without touching the
    /// row (bad token, bad slot) reject before the row even exists; a
    /// duplicate number clears the edited slot, and that mutation is
    /// persisted and recomputed before the error surfaces. Successful edits
    /// are persisted immediately (subject to the per-ticket save guard).
    pub async fn apply_edit(&mut self, intent: EditIntent) -> Result<PrizeResult> {
        let ticket_id = intent.ticket_id();
        let edit = match intent {
            EditIntent::NameEdit { ticket_id, name } => {
                self.state.ticket_mut(ticket_id).player_name = name;
                Ok(())
            }
            EditIntent::NumberEdit {
                ticket_id,
                slot,
                value,
            } => {
                // Reject what never touches the row before materializing it,
                // so a failed first edit leaves no empty row behind.
                if slot >= self.state.mode.slot_count() {
                    return Err(PoolError::Validation {
                        message: format!(
                            "slot {} out of range ({} has {} slots)",
                            slot,
                            self.state.mode,
                            self.state.mode.slot_count()
                        ),
                    });
                }
                if let Some(token) = &value {
                    validate_token(token)?;
                }
                apply_number_edit(self.state.ticket_mut(ticket_id), slot, value)
            }
            EditIntent::FreePlayToggle { ticket_id } => {
                let ticket = self.state.ticket_mut(ticket_id);
                ticket.is_free_play = !ticket.is_free_play;
                Ok(())
            }
        };

        if let Err(e) = self.save_ticket(ticket_id).await {
            tracing::warn!("Failed to save ticket {}: {}", ticket_id, e);
        }
        let result = self.on_tickets_changed();
        edit.map(|()| result)
    }

    /// Persist one ticket row. Returns `Ok(false)` when a save for the same
    /// row is already in flight: the request is dropped, not queued, and the
    /// row only reaches the backend again on a later edit.
    pub async fn save_ticket(&mut self, ticket_id: u32) -> Result<bool> {
        let Some(ticket) = self
            .state
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .cloned()
        else {
            return Ok(false);
        };

        {
            let mut saving = self.saving.lock().expect("saving lock poisoned");
            if !saving.insert(ticket_id) {
                tracing::debug!("Save already in flight for ticket {}, dropping", ticket_id);
                return Ok(false);
            }
        }

        let result = self.store.upsert_ticket(self.state.mode, &ticket).await;
        self.saving
            .lock()
            .expect("saving lock poisoned")
            .remove(&ticket_id);

        let external_id = result?;
        if let (Some(external_id), Some(ticket)) = (
            external_id,
            self.state.tickets.iter_mut().find(|t| t.id == ticket_id),
        ) {
            ticket.external_id = Some(external_id);
        }
        Ok(true)
    }

    /// Toggle one drawn number and replace the persisted set wholesale.
    pub async fn toggle_winning_number(&mut self, token: &str) -> Result<PrizeResult> {
        validate_token(token)?;
        let selected = self.state.winning_numbers.toggle(token);
        tracing::debug!(
            "{} winning number {}",
            if selected { "Selected" } else { "Deselected" },
            token
        );

        if let Err(e) = self
            .store
            .replace(self.state.mode, &self.state.winning_numbers)
            .await
        {
            tracing::warn!("Failed to persist winning numbers: {}", e);
        }
        Ok(self.on_winning_numbers_changed())
    }

    pub async fn clear_winning_numbers(&mut self) -> Result<PrizeResult> {
        self.state.winning_numbers.clear();
        if let Err(e) = self
            .store
            .replace(self.state.mode, &self.state.winning_numbers)
            .await
        {
            tracing::warn!("Failed to clear winning numbers: {}", e);
        }
        Ok(self.on_winning_numbers_changed())
    }

    /// Replace the pot configuration. Persistence is debounced so a burst of
    /// input events produces a single backend write carrying the last state.
    pub fn update_config(&mut self, config: GameModeConfig) -> PrizeResult {
        self.state.config = config;

        let store = self.store.clone();
        let mode = self.state.mode;
        let snapshot = self.state.config.clone();
        self.config_save.schedule(async move {
            if let Err(e) = store.set_config(mode, &snapshot).await {
                tracing::warn!("Failed to save pot configuration: {}", e);
            }
        });

        self.on_config_changed()
    }

    /// Remove one row from the grid and the backend.
    pub async fn delete_ticket(&mut self, ticket_id: u32) -> Result<PrizeResult> {
        let Some(idx) = self.state.tickets.iter().position(|t| t.id == ticket_id) else {
            return Ok(self.on_tickets_changed());
        };
        let removed = self.state.tickets.remove(idx);

        if let Some(external_id) = removed.external_id {
            self.store
                .delete_ticket(self.state.mode, external_id)
                .await?;
        }
        Ok(self.on_tickets_changed())
    }

    /// Full reset for the current game: drop every ticket, zero the pot and
    /// clear the active draw.
    pub async fn delete_all_tickets(&mut self) -> Result<PrizeResult> {
        let mode = self.state.mode;
        tracing::info!("Resetting all data for {}", mode);

        self.store.delete_all(mode).await?;
        self.state.tickets.clear();

        self.config_save.cancel();
        self.state.config = GameModeConfig::default();
        self.store.set_config(mode, &self.state.config).await?;

        self.state.winning_numbers.clear();
        self.store.replace(mode, &self.state.winning_numbers).await?;

        Ok(self.recompute())
    }

    /// Import pre-parsed rows. Each draft validates independently; valid
    /// rows enter the grid at the next free positions and are persisted
    /// through a bounded worker pool so the backend is never hit with more
    /// than `bulk_concurrency` saves at once. A failed save never blocks
    /// the other rows.
    pub async fn bulk_import(&mut self, drafts: Vec<TicketDraft>) -> Result<BulkImportReport> {
        let mut report = BulkImportReport::default();
        let mut new_tickets = Vec::new();
        let mut next_id = self.state.next_row_id();

        for draft in drafts {
            let name = draft.player_name.clone();
            match draft.into_ticket(next_id, self.state.mode) {
                Ok(ticket) => {
                    next_id += 1;
                    report.imported.push(ticket.id);
                    new_tickets.push(ticket.clone());
                    self.state.tickets.push(ticket);
                }
                Err(e) => {
                    tracing::warn!("Rejected imported row for {:?}: {}", name, e);
                    report.rejected += 1;
                }
            }
        }

        // One recompute for the whole batch, not one per row.
        self.on_tickets_changed();

        let semaphore = Arc::new(Semaphore::new(self.bulk_concurrency));
        let mut saves: JoinSet<(u32, Result<Option<i64>>)> = JoinSet::new();
        let mode = self.state.mode;
        for ticket in new_tickets {
            let store = self.store.clone();
            let semaphore = semaphore.clone();
            saves.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (
                        ticket.id,
                        Err(crate::utils::error::PoolError::Store {
                            message: "bulk import worker pool closed".to_string(),
                        }),
                    );
                };
                let result = store.upsert_ticket(mode, &ticket).await;
                (ticket.id, result)
            });
        }

        while let Some(joined) = saves.join_next().await {
            match joined {
                Ok((row_id, Ok(external_id))) => {
                    if let Some(ticket) =
                        self.state.tickets.iter_mut().find(|t| t.id == row_id)
                    {
                        ticket.external_id = external_id;
                    }
                }
                Ok((row_id, Err(e))) => {
                    tracing::warn!("Failed to save imported row {}: {}", row_id, e);
                    report.save_failures.push(row_id);
                }
                Err(e) => {
                    tracing::error!("Bulk import save task panicked: {}", e);
                }
            }
        }
        report.save_failures.sort_unstable();

        tracing::info!(
            "Bulk import: {} rows in, {} rejected, {} save failures",
            report.imported.len(),
            report.rejected,
            report.save_failures.len()
        );
        Ok(report)
    }

    /// Flush any pending debounced write. Call before dropping the engine
    /// at the end of a session.
    pub async fn shutdown(&mut self) {
        self.config_save.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn engine(mode: GameMode) -> PoolEngine<MemoryStore> {
        PoolEngine::new(Arc::new(MemoryStore::new()), mode)
    }

    fn number_edit(ticket_id: u32, slot: usize, token: &str) -> EditIntent {
        EditIntent::NumberEdit {
            ticket_id,
            slot,
            value: Some(token.to_string()),
        }
    }

    #[tokio::test]
    async fn test_edits_create_and_fill_a_row() {
        let mut engine = engine(GameMode::Micro);
        engine
            .apply_edit(EditIntent::NameEdit {
                ticket_id: 1,
                name: "Ana".to_string(),
            })
            .await
            .unwrap();
        engine.apply_edit(number_edit(1, 0, "5")).await.unwrap();
        engine.apply_edit(number_edit(1, 1, "12")).await.unwrap();
        let result = engine.apply_edit(number_edit(1, 2, "30")).await.unwrap();

        assert_eq!(engine.state.tickets.len(), 1);
        assert!(engine.state.tickets[0].is_complete());
        assert_eq!(result.complete_count, 1);
        // The row was persisted and picked up its record id.
        assert!(engine.state.tickets[0].external_id.is_some());
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected_and_row_survives() {
        let mut engine = engine(GameMode::Micro);
        engine.apply_edit(number_edit(1, 0, "5")).await.unwrap();

        let err = engine.apply_edit(number_edit(1, 1, "37")).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.state.tickets[0].numbers[1], None);
        assert_eq!(engine.state.tickets[0].numbers[0].as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_duplicate_edit_persists_cleared_slot_and_recomputes() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = PoolEngine::new(store.clone(), GameMode::Micro);
        for (slot, token) in ["5", "12", "30"].iter().enumerate() {
            engine.apply_edit(number_edit(1, slot, token)).await.unwrap();
        }
        for token in ["5", "12", "30"] {
            engine.toggle_winning_number(token).await.unwrap();
        }
        assert_eq!(engine.state.tickets[0].hit_count, 3);

        // Repeating "5" in the last slot clears that slot. The row leaves
        // the winner list and the cleared cell reaches the backend even
        // though the edit itself is rejected.
        let err = engine.apply_edit(number_edit(1, 2, "5")).await.unwrap_err();
        assert!(matches!(err, PoolError::DuplicateNumber { .. }));
        assert_eq!(engine.state.tickets[0].numbers[2], None);
        assert_eq!(engine.state.tickets[0].hit_count, 2);

        let result = engine.recompute_for(Weekday::Mon);
        assert!(result.winners.is_empty());
        assert_eq!(result.complete_count, 0);

        let stored = store.list_tickets(GameMode::Micro).await.unwrap();
        assert_eq!(stored[0].numbers[2], None);
        assert_eq!(stored[0].numbers[0].as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn test_rejected_first_edit_leaves_no_phantom_row() {
        let mut engine = engine(GameMode::Micro);

        let err = engine.apply_edit(number_edit(7, 0, "37")).await.unwrap_err();
        assert!(err.is_validation());
        assert!(engine.state.tickets.is_empty());

        // Out-of-range slots are rejected before the row exists too.
        assert!(engine.apply_edit(number_edit(8, 3, "5")).await.is_err());
        assert!(engine.state.tickets.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_winning_numbers_recomputes_hits() {
        let mut engine = engine(GameMode::Micro);
        engine
            .apply_edit(EditIntent::NameEdit {
                ticket_id: 1,
                name: "Ana".to_string(),
            })
            .await
            .unwrap();
        for (slot, token) in ["5", "12", "30"].iter().enumerate() {
            engine.apply_edit(number_edit(1, slot, token)).await.unwrap();
        }

        engine.toggle_winning_number("5").await.unwrap();
        let result = engine.toggle_winning_number("30").await.unwrap();
        assert_eq!(engine.state.tickets[0].hit_count, 2);
        assert!(result.winners.is_empty());

        let result = engine.toggle_winning_number("12").await.unwrap();
        assert_eq!(engine.state.tickets[0].hit_count, 3);
        assert_eq!(result.winners.len(), 1);

        // Toggling a selected number off drops the hit again.
        let result = engine.toggle_winning_number("12").await.unwrap();
        assert_eq!(engine.state.tickets[0].hit_count, 2);
        assert!(result.winners.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_rejects_invalid_token() {
        let mut engine = engine(GameMode::Polla);
        assert!(engine.toggle_winning_number("37").await.is_err());
        assert!(engine.state.winning_numbers.is_empty());
    }

    #[tokio::test]
    async fn test_save_guard_drops_concurrent_request() {
        let mut engine = engine(GameMode::Micro);
        engine.apply_edit(number_edit(1, 0, "5")).await.unwrap();

        // Simulate an in-flight save for the row.
        engine.saving.lock().unwrap().insert(1);
        assert!(!engine.save_ticket(1).await.unwrap());

        engine.saving.lock().unwrap().remove(&1);
        assert!(engine.save_ticket(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_unknown_row_is_a_noop() {
        let mut engine = engine(GameMode::Micro);
        assert!(!engine.save_ticket(99).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_config_persists_last_value_only() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = PoolEngine::new(store.clone(), GameMode::Polla);

        let mut config = GameModeConfig::default();
        config.weekly_pot = 100;
        engine.update_config(config.clone());
        config.weekly_pot = 250;
        let result = engine.update_config(config.clone());
        assert_eq!(result.weekly_pot, 250);

        engine.shutdown().await;
        let persisted = store.get_config(GameMode::Polla).await.unwrap().unwrap();
        assert_eq!(persisted.weekly_pot, 250);
    }

    #[tokio::test]
    async fn test_delete_all_resets_pot_and_draw() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = PoolEngine::new(store.clone(), GameMode::Micro);

        engine.apply_edit(number_edit(1, 0, "5")).await.unwrap();
        engine.toggle_winning_number("5").await.unwrap();
        let mut config = GameModeConfig::default();
        config.weekly_pot = 300;
        engine.update_config(config);

        let result = engine.delete_all_tickets().await.unwrap();
        assert!(engine.state.tickets.is_empty());
        assert!(engine.state.winning_numbers.is_empty());
        assert_eq!(result.total_pot, 0);

        assert_eq!(store.ticket_count(GameMode::Micro), 0);
        assert!(store.get_latest(GameMode::Micro).await.unwrap().is_none());
        let persisted = store.get_config(GameMode::Micro).await.unwrap().unwrap();
        assert_eq!(persisted, GameModeConfig::default());
    }

    #[tokio::test]
    async fn test_bulk_import_validates_rows_independently() {
        let mut engine = engine(GameMode::Micro);
        let drafts = vec![
            TicketDraft::new(
                "Ana",
                vec!["5".to_string(), "12".to_string(), "30".to_string()],
                false,
            ),
            TicketDraft::new("Mal", vec!["37".to_string()], false),
            TicketDraft::new(
                "Luis",
                vec!["1".to_string(), "2".to_string(), "3".to_string()],
                true,
            ),
        ];

        let report = engine.bulk_import(drafts).await.unwrap();
        assert_eq!(report.imported, vec![1, 2]);
        assert_eq!(report.rejected, 1);
        assert!(report.save_failures.is_empty());

        assert_eq!(engine.state.tickets.len(), 2);
        assert!(engine.state.tickets.iter().all(|t| t.external_id.is_some()));
    }

    #[tokio::test]
    async fn test_bulk_import_save_failure_does_not_block_others() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = PoolEngine::new(store.clone(), GameMode::Micro);
        store.fail_next_upserts(1);

        let drafts: Vec<TicketDraft> = (0..4)
            .map(|i| {
                TicketDraft::new(
                    format!("Player {}", i),
                    vec![
                        (i * 3 + 1).to_string(),
                        (i * 3 + 2).to_string(),
                        (i * 3 + 3).to_string(),
                    ],
                    false,
                )
            })
            .collect();

        let report = engine.bulk_import(drafts).await.unwrap();
        assert_eq!(report.imported.len(), 4);
        assert_eq!(report.save_failures.len(), 1);
        assert_eq!(store.ticket_count(GameMode::Micro), 3);
    }

    #[tokio::test]
    async fn test_daily_pot_mirrors_todays_weekday_value() {
        let mut engine = engine(GameMode::Polla);
        let mut config = GameModeConfig::default();
        config.tuesday = 80;
        engine.update_config(config);

        let result = engine.recompute_for(Weekday::Tue);
        assert_eq!(result.daily_pot, 80);
        assert_eq!(engine.state.config.daily_pot, 80);

        let result = engine.recompute_for(Weekday::Wed);
        assert_eq!(result.daily_pot, 0);
        assert_eq!(engine.state.config.daily_pot, 0);
    }
}
