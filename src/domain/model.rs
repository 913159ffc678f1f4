use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::utils::error::PoolError;

pub const DEFAULT_TICKET_PRICE: i64 = 50;

/// The two independent games: "polla" plays 6 numbers, "micro" plays 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Polla,
    Micro,
}

impl GameMode {
    pub fn slot_count(&self) -> usize {
        match self {
            GameMode::Polla => 6,
            GameMode::Micro => 3,
        }
    }

    /// Jackpot threshold: all slots matching.
    pub fn max_hits(&self) -> u32 {
        self.slot_count() as u32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Polla => "polla",
            GameMode::Micro => "micro",
        }
    }
}

impl FromStr for GameMode {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polla" => Ok(GameMode::Polla),
            "micro" => Ok(GameMode::Micro),
            other => Err(PoolError::Config {
                message: format!("unknown game mode: {} (expected polla or micro)", other),
            }),
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One player row. `id` is the stable in-grid row identity (1..N);
/// `external_id` is the backend record id once the row has been persisted.
/// Number slots are positional, so a half-filled row keeps its gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: u32,
    pub external_id: Option<i64>,
    pub player_name: String,
    pub numbers: Vec<Option<String>>,
    pub is_free_play: bool,
    pub hit_count: u32,
}

impl Ticket {
    pub fn new(id: u32, mode: GameMode) -> Self {
        Self {
            id,
            external_id: None,
            player_name: String::new(),
            numbers: vec![None; mode.slot_count()],
            is_free_play: false,
            hit_count: 0,
        }
    }

    /// Tokens actually chosen, skipping empty slots.
    pub fn chosen_numbers(&self) -> impl Iterator<Item = &str> {
        self.numbers.iter().flatten().map(String::as_str)
    }

    /// Only complete tickets participate in prize computations.
    pub fn is_complete(&self) -> bool {
        self.numbers.iter().all(Option::is_some)
    }

    pub fn has_number(&self, token: &str) -> bool {
        self.chosen_numbers().any(|n| n == token)
    }
}

/// The currently drawn numbers for one game mode. Unique and unordered;
/// replaced wholesale when the operator toggles or clears the selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WinningNumbers {
    numbers: HashSet<String>,
}

impl WinningNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            numbers: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.numbers.contains(token)
    }

    /// Returns true when the token is now selected.
    pub fn toggle(&mut self, token: &str) -> bool {
        if self.numbers.remove(token) {
            false
        } else {
            self.numbers.insert(token.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Sorted snapshot for persistence and display.
    pub fn to_vec(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.numbers.iter().cloned().collect();
        tokens.sort();
        tokens
    }
}

/// Per-mode pot configuration. Field names on the wire are the original
/// backend columns, stored as one JSON document per game mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModeConfig {
    #[serde(rename = "lunes", default)]
    pub monday: i64,
    #[serde(rename = "martes", default)]
    pub tuesday: i64,
    #[serde(rename = "miércoles", default)]
    pub wednesday: i64,
    #[serde(rename = "jueves", default)]
    pub thursday: i64,
    #[serde(rename = "viernes", default)]
    pub friday: i64,
    #[serde(rename = "sábado", default)]
    pub saturday: i64,
    #[serde(rename = "domingo", default)]
    pub sunday: i64,
    #[serde(rename = "garantizado", default)]
    pub guaranteed_minimum: i64,
    #[serde(rename = "acumulado", default)]
    pub accumulated_carry: i64,
    #[serde(rename = "precioJugada", default = "default_ticket_price")]
    pub ticket_price: i64,
    #[serde(rename = "poteDiario", default)]
    pub daily_pot: i64,
    #[serde(rename = "poteSemanal", default)]
    pub weekly_pot: i64,
}

fn default_ticket_price() -> i64 {
    DEFAULT_TICKET_PRICE
}

impl Default for GameModeConfig {
    fn default() -> Self {
        Self {
            monday: 0,
            tuesday: 0,
            wednesday: 0,
            thursday: 0,
            friday: 0,
            saturday: 0,
            sunday: 0,
            guaranteed_minimum: 0,
            accumulated_carry: 0,
            ticket_price: DEFAULT_TICKET_PRICE,
            daily_pot: 0,
            weekly_pot: 0,
        }
    }
}

impl GameModeConfig {
    /// Weekday adjustments may be negative.
    pub fn weekday_value(&self, day: Weekday) -> i64 {
        match day {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// A misconfigured price falls back to the default instead of failing.
    pub fn effective_ticket_price(&self) -> i64 {
        if self.ticket_price > 0 {
            self.ticket_price
        } else {
            DEFAULT_TICKET_PRICE
        }
    }
}

/// Outcome of one prize-pool computation. Monetary values are integers in
/// the smallest currency unit; division always truncates.
#[derive(Debug, Clone, PartialEq)]
pub struct PrizeResult {
    pub total_pot: i64,
    pub gross_revenue: i64,
    pub prize_contribution: i64,
    pub house_cut: i64,
    pub daily_pot: i64,
    pub weekly_pot: i64,
    pub complete_count: usize,
    pub paying_count: usize,
    pub free_play_count: usize,
    pub amount_per_winner: i64,
    pub winners: Vec<Ticket>,
}

/// Visual emphasis tier for a row. Never drives payout: intermediate hit
/// levels classify for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTier {
    Jackpot,
    Five,
    Four,
    Three,
    Two,
    One,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_mode_parsing() {
        assert_eq!("polla".parse::<GameMode>().unwrap(), GameMode::Polla);
        assert_eq!("micro".parse::<GameMode>().unwrap(), GameMode::Micro);
        assert!("ruleta".parse::<GameMode>().is_err());
    }

    #[test]
    fn test_ticket_completeness() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        assert!(!ticket.is_complete());
        assert_eq!(ticket.chosen_numbers().count(), 0);

        ticket.numbers[0] = Some("5".to_string());
        ticket.numbers[2] = Some("12".to_string());
        assert!(!ticket.is_complete());
        assert_eq!(ticket.chosen_numbers().count(), 2);

        ticket.numbers[1] = Some("30".to_string());
        assert!(ticket.is_complete());
        assert!(ticket.has_number("30"));
        assert!(!ticket.has_number("31"));
    }

    #[test]
    fn test_winning_numbers_toggle() {
        let mut set = WinningNumbers::new();
        assert!(set.toggle("17"));
        assert!(set.contains("17"));
        assert!(!set.toggle("17"));
        assert!(!set.contains("17"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_winning_numbers_snapshot_is_sorted() {
        let set = WinningNumbers::from_tokens(["9", "00", "17", "3"]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.to_vec(), vec!["00", "17", "3", "9"]);
    }

    #[test]
    fn test_config_wire_keys() {
        let config = GameModeConfig {
            wednesday: 150,
            guaranteed_minimum: 600,
            ..Default::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["miércoles"], 150);
        assert_eq!(json["garantizado"], 600);
        assert_eq!(json["precioJugada"], 50);

        let parsed: GameModeConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_defaults_tolerate_sparse_documents() {
        let parsed: GameModeConfig = serde_json::from_str(r#"{"lunes": 20}"#).unwrap();
        assert_eq!(parsed.monday, 20);
        assert_eq!(parsed.ticket_price, DEFAULT_TICKET_PRICE);
        assert_eq!(parsed.weekly_pot, 0);
    }

    #[test]
    fn test_effective_ticket_price_fallback() {
        let mut config = GameModeConfig::default();
        config.ticket_price = 0;
        assert_eq!(config.effective_ticket_price(), DEFAULT_TICKET_PRICE);
        config.ticket_price = -10;
        assert_eq!(config.effective_ticket_price(), DEFAULT_TICKET_PRICE);
        config.ticket_price = 100;
        assert_eq!(config.effective_ticket_price(), 100);
    }
}
