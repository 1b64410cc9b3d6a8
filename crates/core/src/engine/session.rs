use serde::Serialize;

use crate::{
    layout::GridSize,
    pairing::Pairing,
    timeline::{MismatchToken, TimerToken},
    tones::Tone,
};

/// Per-card state.
///
/// `Mismatched` is a face-up card from a failed guess that is waiting for its
/// automatic reset back to `Hidden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardState {
    Hidden,
    Open,
    Mismatched,
    Matched,
}

impl CardState {
    /// Whether the card currently shows its face.
    pub fn is_face_up(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Card {
    pub index: usize,
    pub pair_value: usize,
    pub tone: Tone,
    pub state: CardState,
}

/// Two face-up cards from a failed guess and the token of their reset timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMismatch {
    pub cards: (usize, usize),
    pub token: MismatchToken,
    pub(crate) timer: TimerToken,
}

/// Board state of one game. Replaced wholesale on every setup.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: u64,
    tones_in_play: Vec<Tone>,
    grid: GridSize,
    pub(crate) cards: Vec<Card>,
    pub(crate) opened: Option<usize>,
    pub(crate) pending_mismatch: Option<PendingMismatch>,
    next_mismatch: u64,
}

impl GameSession {
    pub(crate) fn new(id: u64, tones_in_play: Vec<Tone>, grid: GridSize, pairing: &Pairing) -> Self {
        let cards = pairing
            .slot_values()
            .iter()
            .enumerate()
            .map(|(index, &pair_value)| Card {
                index,
                pair_value,
                tone: pairing.tones()[pair_value],
                state: CardState::Hidden,
            })
            .collect();

        Self {
            id,
            tones_in_play,
            grid,
            cards,
            opened: None,
            pending_mismatch: None,
            next_mismatch: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The active tone set this board was built from, in catalog order.
    pub fn tones_in_play(&self) -> &[Tone] {
        &self.tones_in_play
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    /// The single face-up card waiting for its partner, if any.
    pub fn opened_card(&self) -> Option<usize> {
        self.opened
    }

    pub fn pending_mismatch(&self) -> Option<PendingMismatch> {
        self.pending_mismatch
    }

    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(|card| card.state == CardState::Matched)
    }

    /// Index of the other card sharing `index`'s pair value.
    pub fn partner_of(&self, index: usize) -> Option<usize> {
        let pair_value = self.cards.get(index)?.pair_value;
        self.cards
            .iter()
            .position(|card| card.index != index && card.pair_value == pair_value)
    }

    pub(crate) fn set_state(&mut self, index: usize, state: CardState) {
        self.cards[index].state = state;
    }

    pub(crate) fn next_mismatch_token(&mut self) -> MismatchToken {
        let token = MismatchToken {
            session: self.id,
            sequence: self.next_mismatch,
        };
        self.next_mismatch += 1;
        token
    }
}
