//! Card-drawing session core: the session state machine and the deck service it drives.

pub mod controller;
pub mod error;
pub mod service;
pub mod session;

pub use controller::{IntentOutcome, SessionController, SessionEvent};
pub use error::{InvalidSelection, ServiceError};
pub use service::{
    DeckService, DrawResult, HttpDeckService, NewDeck, DEFAULT_DECK_API_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use session::{DrawnCard, Phase, Session, HISTORY_LIMIT};
