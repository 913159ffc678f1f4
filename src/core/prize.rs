use chrono::Weekday;

use crate::domain::model::{GameMode, GameModeConfig, HitTier, PrizeResult, Ticket, WinningNumbers};

/// Share of gross revenue that feeds the prize pool; the house keeps the rest.
const PRIZE_SHARE_PERCENT: i64 = 80;

/// Recompute `hit_count` for every ticket against the current winning set.
/// Idempotent and order-independent; an empty winning set zeroes everything.
pub fn compute_hits(tickets: &mut [Ticket], winning: &WinningNumbers) {
    for ticket in tickets.iter_mut() {
        ticket.hit_count = ticket
            .chosen_numbers()
            .filter(|token| winning.contains(token))
            .count() as u32;
    }
}

/// Derive the prize distribution for one game mode. `today` selects the
/// daily pot from the per-weekday configuration and is supplied by the
/// caller so the computation stays clock-free.
///
/// Only complete tickets participate. Winners are the complete tickets at
/// exactly `max_hits`; free plays count toward the winner list and the
/// divisor, they are just excluded from revenue. Lower hit levels never
/// receive a share.
pub fn compute_prize_pool(
    tickets: &[Ticket],
    config: &GameModeConfig,
    mode: GameMode,
    today: Weekday,
) -> PrizeResult {
    let complete: Vec<&Ticket> = tickets.iter().filter(|t| t.is_complete()).collect();
    let free_play_count = complete.iter().filter(|t| t.is_free_play).count();
    let paying_count = complete.len() - free_play_count;

    let ticket_price = config.effective_ticket_price();
    let gross_revenue = paying_count as i64 * ticket_price;
    let prize_contribution = gross_revenue * PRIZE_SHARE_PERCENT / 100;
    let house_cut = gross_revenue - prize_contribution;

    let daily_pot = config.weekday_value(today);
    let weekly_pot = config.weekly_pot;

    // The guaranteed minimum is part of the displayed pool even when nobody
    // qualifies; it is only ever paid to winners at the top hit level.
    let total_pot = prize_contribution
        + daily_pot
        + weekly_pot
        + config.accumulated_carry
        + config.guaranteed_minimum;

    let max_hits = mode.max_hits();
    let winners: Vec<Ticket> = complete
        .iter()
        .filter(|t| t.hit_count == max_hits)
        .map(|t| (*t).clone())
        .collect();

    let amount_per_winner = if winners.is_empty() {
        0
    } else {
        let share = total_pot.div_euclid(winners.len() as i64);
        share.max(config.guaranteed_minimum)
    };

    PrizeResult {
        total_pot,
        gross_revenue,
        prize_contribution,
        house_cut,
        daily_pot,
        weekly_pot,
        complete_count: complete.len(),
        paying_count,
        free_play_count,
        amount_per_winner,
        winners,
    }
}

/// Display tier for a row. Jackpot needs a non-empty winning set; polla has
/// intermediate tiers down to one hit, micro only two and one. Zero hits
/// has no tier.
pub fn classify_hits(hit_count: u32, mode: GameMode, winning_nonempty: bool) -> Option<HitTier> {
    if hit_count == 0 {
        return None;
    }
    if winning_nonempty && hit_count == mode.max_hits() {
        return Some(HitTier::Jackpot);
    }
    match (mode, hit_count) {
        (GameMode::Polla, 5) => Some(HitTier::Five),
        (GameMode::Polla, 4) => Some(HitTier::Four),
        (GameMode::Polla, 3) => Some(HitTier::Three),
        (GameMode::Polla, 2) => Some(HitTier::Two),
        (GameMode::Polla, 1) => Some(HitTier::One),
        (GameMode::Micro, 2) => Some(HitTier::Two),
        (GameMode::Micro, 1) => Some(HitTier::One),
        _ => None,
    }
}
