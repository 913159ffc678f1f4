pub mod config;
pub mod core;
pub mod domain;
pub mod store;
pub mod utils;

pub use crate::config::{BackendConfig, CliConfig};
pub use crate::core::engine::{BulkImportReport, PoolEngine, PoolState};
pub use crate::core::intents::{EditIntent, TicketDraft};
pub use crate::core::scheduler::DebouncedTask;
pub use crate::domain::model::{
    GameMode, GameModeConfig, HitTier, PrizeResult, Ticket, WinningNumbers,
};
pub use crate::store::{memory::MemoryStore, rest::RestStore};
pub use crate::utils::error::{PoolError, Result};
