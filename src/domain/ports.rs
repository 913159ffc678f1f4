use crate::domain::model::{GameMode, GameModeConfig, Ticket, WinningNumbers};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Player ticket persistence for one game mode.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Tickets in stable row order, with local row ids assigned 1..N.
    async fn list_tickets(&self, mode: GameMode) -> Result<Vec<Ticket>>;

    /// Insert or update one ticket; returns the authoritative record id.
    async fn upsert_ticket(&self, mode: GameMode, ticket: &Ticket) -> Result<Option<i64>>;

    async fn delete_ticket(&self, mode: GameMode, external_id: i64) -> Result<()>;

    async fn delete_all(&self, mode: GameMode) -> Result<()>;
}

/// Pot configuration, one document per game mode.
#[async_trait]
pub trait PotStore: Send + Sync {
    async fn get_config(&self, mode: GameMode) -> Result<Option<GameModeConfig>>;

    async fn set_config(&self, mode: GameMode, config: &GameModeConfig) -> Result<()>;
}

/// Drawn winning numbers, at most one active set per game mode.
#[async_trait]
pub trait WinningNumberStore: Send + Sync {
    async fn get_latest(&self, mode: GameMode) -> Result<Option<WinningNumbers>>;

    /// Replace the active set wholesale: delete the latest record, then
    /// insert the new one if it is non-empty. Never a partial update.
    async fn replace(&self, mode: GameMode, numbers: &WinningNumbers) -> Result<()>;
}

/// A complete backend: anything that persists tickets, pot configuration
/// and winning numbers.
pub trait Backend: TicketStore + PotStore + WinningNumberStore {}

impl<T: TicketStore + PotStore + WinningNumberStore> Backend for T {}
