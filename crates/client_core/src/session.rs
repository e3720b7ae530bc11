//! Session state owned by [`crate::SessionController`].

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use shared::{
    domain::{DeckId, STANDARD_DECK_SIZE},
    protocol::{CardImages, CardPayload},
};

/// Number of recent draws kept in a session.
pub const HISTORY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initializing,
    Ready,
    Drawing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawnCard {
    pub code: String,
    pub suit: String,
    pub value: String,
    pub image: String,
    pub images: CardImages,
    /// Local time the draw result was applied; the service does not supply one.
    pub drawn_at: DateTime<Utc>,
}

impl DrawnCard {
    pub fn from_payload(card: CardPayload, drawn_at: DateTime<Utc>) -> Self {
        Self {
            code: card.code,
            suit: card.suit,
            value: card.value,
            image: card.image,
            images: card.images,
            drawn_at,
        }
    }

    pub fn label(&self) -> String {
        format!("{} of {}", self.value, self.suit)
    }

    pub fn drawn_at_local(&self) -> String {
        self.drawn_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub deck_id: Option<DeckId>,
    /// Most recent first.
    pub history: Vec<DrawnCard>,
    pub selected_index: Option<usize>,
    pub remaining: u32,
    pub phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            deck_id: None,
            history: Vec::new(),
            selected_index: None,
            remaining: STANDARD_DECK_SIZE,
            phase: Phase::Initializing,
        }
    }
}

impl Session {
    pub fn selected_card(&self) -> Option<&DrawnCard> {
        self.selected_index.and_then(|index| self.history.get(index))
    }

    pub fn can_draw(&self) -> bool {
        self.phase == Phase::Ready && self.deck_id.is_some()
    }

    pub(crate) fn push_drawn(&mut self, card: DrawnCard) {
        self.history.insert(0, card);
        self.history.truncate(HISTORY_LIMIT);
        self.selected_index = Some(0);
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear();
        self.selected_index = None;
    }

    /// Checks the invariants every published session must satisfy.
    pub fn is_consistent(&self) -> bool {
        self.history.len() <= HISTORY_LIMIT
            && self
                .selected_index
                .map_or(true, |index| index < self.history.len())
            && self.remaining <= STANDARD_DECK_SIZE
    }
}
