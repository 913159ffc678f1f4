pub mod engine;
pub mod intents;
pub mod prize;
pub mod scheduler;

pub use crate::domain::model::{
    GameMode, GameModeConfig, HitTier, PrizeResult, Ticket, WinningNumbers,
};
pub use crate::domain::ports::{Backend, PotStore, TicketStore, WinningNumberStore};
pub use crate::utils::error::Result;
