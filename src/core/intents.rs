use crate::domain::model::{GameMode, Ticket};
use crate::utils::error::{PoolError, Result};
use crate::utils::validation::validate_token;

/// A single grid edit, decoupled from whatever surface produced it
/// (cell editor, paste, checkbox).
#[derive(Debug, Clone, PartialEq)]
pub enum EditIntent {
    NameEdit {
        ticket_id: u32,
        name: String,
    },
    NumberEdit {
        ticket_id: u32,
        slot: usize,
        /// `None` clears the slot.
        value: Option<String>,
    },
    FreePlayToggle {
        ticket_id: u32,
    },
}

impl EditIntent {
    pub fn ticket_id(&self) -> u32 {
        match self {
            EditIntent::NameEdit { ticket_id, .. }
            | EditIntent::NumberEdit { ticket_id, .. }
            | EditIntent::FreePlayToggle { ticket_id } => *ticket_id,
        }
    }
}

/// One pre-parsed row for bulk import. Parsing the clipboard into rows is
/// the caller's problem; drafts arrive already split into fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDraft {
    pub player_name: String,
    pub numbers: Vec<String>,
    pub is_free_play: bool,
}

impl TicketDraft {
    pub fn new(player_name: impl Into<String>, numbers: Vec<String>, is_free_play: bool) -> Self {
        Self {
            player_name: player_name.into(),
            numbers,
            is_free_play,
        }
    }

    /// Materialize the draft as a ticket. Fails on invalid or repeated
    /// tokens and on more numbers than the mode has slots; fewer numbers
    /// leave trailing slots empty (an incomplete row).
    pub fn into_ticket(self, id: u32, mode: GameMode) -> Result<Ticket> {
        if self.numbers.len() > mode.slot_count() {
            return Err(PoolError::Validation {
                message: format!(
                    "row for {} has {} numbers, {} allows at most {}",
                    self.player_name,
                    self.numbers.len(),
                    mode,
                    mode.slot_count()
                ),
            });
        }

        let mut ticket = Ticket::new(id, mode);
        ticket.player_name = self.player_name;
        ticket.is_free_play = self.is_free_play;
        for (slot, token) in self.numbers.into_iter().enumerate() {
            validate_token(&token)?;
            if ticket.has_number(&token) {
                return Err(PoolError::DuplicateNumber { token });
            }
            ticket.numbers[slot] = Some(token);
        }
        Ok(ticket)
    }
}

/// Apply one number edit to a ticket, enforcing the vocabulary and the
/// no-repeats invariant. An invalid token leaves the slot untouched; a
/// duplicate clears the edited slot and keeps the rest of the row intact.
pub fn apply_number_edit(ticket: &mut Ticket, slot: usize, value: Option<String>) -> Result<()> {
    if slot >= ticket.numbers.len() {
        return Err(PoolError::Validation {
            message: format!(
                "slot {} out of range (ticket has {} slots)",
                slot,
                ticket.numbers.len()
            ),
        });
    }

    let Some(token) = value else {
        ticket.numbers[slot] = None;
        return Ok(());
    };

    validate_token(&token)?;

    let duplicate = ticket
        .numbers
        .iter()
        .enumerate()
        .any(|(i, n)| i != slot && n.as_deref() == Some(token.as_str()));
    if duplicate {
        ticket.numbers[slot] = None;
        return Err(PoolError::DuplicateNumber { token });
    }

    ticket.numbers[slot] = Some(token);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_edit_sets_slot() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        apply_number_edit(&mut ticket, 0, Some("17".to_string())).unwrap();
        assert_eq!(ticket.numbers[0].as_deref(), Some("17"));
    }

    #[test]
    fn test_number_edit_rejects_out_of_vocabulary_token() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        ticket.numbers[0] = Some("5".to_string());

        let err = apply_number_edit(&mut ticket, 1, Some("37".to_string())).unwrap_err();
        assert!(matches!(err, PoolError::InvalidNumber { .. }));
        // The slot stays unset and the rest of the row is untouched.
        assert_eq!(ticket.numbers[1], None);
        assert_eq!(ticket.numbers[0].as_deref(), Some("5"));
    }

    #[test]
    fn test_number_edit_duplicate_clears_edited_slot_only() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        ticket.numbers[0] = Some("5".to_string());
        ticket.numbers[1] = Some("12".to_string());

        let err = apply_number_edit(&mut ticket, 2, Some("5".to_string())).unwrap_err();
        assert!(matches!(err, PoolError::DuplicateNumber { .. }));
        assert_eq!(ticket.numbers[2], None);
        assert_eq!(ticket.numbers[0].as_deref(), Some("5"));
        assert_eq!(ticket.numbers[1].as_deref(), Some("12"));
    }

    #[test]
    fn test_number_edit_overwriting_own_slot_is_not_a_duplicate() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        ticket.numbers[0] = Some("5".to_string());
        apply_number_edit(&mut ticket, 0, Some("5".to_string())).unwrap();
        assert_eq!(ticket.numbers[0].as_deref(), Some("5"));
    }

    #[test]
    fn test_number_edit_clear() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        ticket.numbers[0] = Some("5".to_string());
        apply_number_edit(&mut ticket, 0, None).unwrap();
        assert_eq!(ticket.numbers[0], None);
    }

    #[test]
    fn test_number_edit_slot_out_of_range() {
        let mut ticket = Ticket::new(1, GameMode::Micro);
        let err = apply_number_edit(&mut ticket, 3, Some("5".to_string())).unwrap_err();
        assert!(matches!(err, PoolError::Validation { .. }));
    }

    #[test]
    fn test_draft_into_ticket() {
        let draft = TicketDraft::new(
            "María",
            vec!["5".to_string(), "12".to_string(), "30".to_string()],
            false,
        );
        let ticket = draft.into_ticket(3, GameMode::Micro).unwrap();
        assert_eq!(ticket.id, 3);
        assert_eq!(ticket.player_name, "María");
        assert!(ticket.is_complete());
    }

    #[test]
    fn test_partial_draft_leaves_trailing_slots_empty() {
        let draft = TicketDraft::new("Pedro", vec!["00".to_string()], false);
        let ticket = draft.into_ticket(1, GameMode::Polla).unwrap();
        assert!(!ticket.is_complete());
        assert_eq!(ticket.numbers[0].as_deref(), Some("00"));
        assert_eq!(ticket.numbers[5], None);
    }

    #[test]
    fn test_draft_rejects_repeats_and_overflow() {
        let repeated = TicketDraft::new(
            "Ana",
            vec!["7".to_string(), "7".to_string(), "8".to_string()],
            false,
        );
        assert!(repeated.into_ticket(1, GameMode::Micro).is_err());

        let overflowing = TicketDraft::new(
            "Ana",
            vec!["1".to_string(), "2".to_string(), "3".to_string(), "4".to_string()],
            false,
        );
        assert!(overflowing.into_ticket(1, GameMode::Micro).is_err());
    }
}
