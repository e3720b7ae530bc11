//! Session controller: the only writer of [`Session`].
//!
//! Intents mutate the session in two steps. The start transition is applied
//! and published immediately, then the remote call runs without holding the
//! state lock, then the completion is folded in atomically. Every reshuffle
//! bumps a generation counter; completions carry the generation they started
//! under and are dropped when it is no longer current.

use std::sync::Arc;

use chrono::Utc;
use shared::domain::STANDARD_DECK_SIZE;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{InvalidSelection, ServiceError},
    service::DeckService,
    session::{DrawnCard, Phase, Session},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Observer notifications. `StateChanged` follows every completed transition,
/// `Error` every failed remote call that was still current.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(Session),
    Error(ServiceError),
}

/// What happened to an intent, reported to the caller that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Applied,
    /// Not valid in the current phase; state untouched.
    Ignored,
    /// A newer reshuffle started while the call was outstanding; its result was dropped.
    Superseded,
    Failed(ServiceError),
}

struct ControllerState {
    session: Session,
    generation: u64,
    /// Last count the service confirmed for `session.deck_id`.
    deck_remaining: u32,
}

pub struct SessionController {
    service: Arc<dyn DeckService>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(service: Arc<dyn DeckService>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            service,
            inner: Mutex::new(ControllerState {
                session: Session::default(),
                generation: 0,
                deck_remaining: STANDARD_DECK_SIZE,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> Session {
        self.inner.lock().await.session.clone()
    }

    pub async fn reshuffle(&self) -> IntentOutcome {
        let generation = {
            let mut guard = self.inner.lock().await;
            guard.generation += 1;
            let session = &mut guard.session;
            session.phase = Phase::Initializing;
            session.clear_history();
            session.remaining = STANDARD_DECK_SIZE;
            self.publish(session);
            guard.generation
        };
        info!(generation, "session: reshuffle requested");

        let result = self.service.request_new_deck().await;

        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(
                generation,
                current = guard.generation,
                ok = result.is_ok(),
                "session: dropping superseded shuffle response"
            );
            return IntentOutcome::Superseded;
        }

        let state = &mut *guard;
        let session = &mut state.session;
        session.phase = Phase::Ready;
        match result {
            Ok(deck) => {
                info!(
                    generation,
                    deck_id = %deck.deck_id,
                    remaining = deck.remaining,
                    "session: deck shuffled"
                );
                session.deck_id = Some(deck.deck_id);
                session.remaining = deck.remaining;
                state.deck_remaining = deck.remaining;
                self.publish(session);
                IntentOutcome::Applied
            }
            Err(err) => {
                warn!(generation, error = %err, "session: reshuffle failed");
                // The previous deck is still live remotely, so its count is too.
                if session.deck_id.is_some() {
                    session.remaining = state.deck_remaining;
                }
                self.publish(session);
                self.publish_error(&err);
                IntentOutcome::Failed(err)
            }
        }
    }

    pub async fn draw_one(&self) -> IntentOutcome {
        let (generation, deck_id) = {
            let mut guard = self.inner.lock().await;
            let session = &mut guard.session;
            let deck_id = match &session.deck_id {
                Some(deck_id) if session.can_draw() => deck_id.clone(),
                _ => {
                    debug!(phase = ?session.phase, "session: draw ignored");
                    return IntentOutcome::Ignored;
                }
            };
            session.phase = Phase::Drawing;
            self.publish(session);
            (guard.generation, deck_id)
        };
        info!(generation, %deck_id, "session: drawing one card");

        let result = self.service.request_draw(&deck_id).await;

        let mut guard = self.inner.lock().await;
        if guard.generation != generation {
            debug!(
                generation,
                current = guard.generation,
                ok = result.is_ok(),
                "session: dropping draw response for a replaced deck"
            );
            return IntentOutcome::Superseded;
        }

        let state = &mut *guard;
        let session = &mut state.session;
        session.phase = Phase::Ready;
        match result {
            Ok(drawn) => {
                info!(
                    generation,
                    code = %drawn.card.code,
                    remaining = drawn.remaining,
                    "session: card drawn"
                );
                session.push_drawn(DrawnCard::from_payload(drawn.card, Utc::now()));
                session.remaining = drawn.remaining;
                state.deck_remaining = drawn.remaining;
                self.publish(session);
                IntentOutcome::Applied
            }
            Err(err) => {
                warn!(generation, %deck_id, error = %err, "session: draw failed");
                self.publish(session);
                self.publish_error(&err);
                IntentOutcome::Failed(err)
            }
        }
    }

    pub async fn select_history_entry(&self, index: usize) -> Result<(), InvalidSelection> {
        let mut guard = self.inner.lock().await;
        let session = &mut guard.session;
        if index >= session.history.len() {
            return Err(InvalidSelection {
                index,
                len: session.history.len(),
            });
        }
        session.selected_index = Some(index);
        self.publish(session);
        Ok(())
    }

    fn publish(&self, session: &Session) {
        debug_assert!(session.is_consistent(), "inconsistent session: {session:?}");
        let _ = self.events.send(SessionEvent::StateChanged(session.clone()));
    }

    fn publish_error(&self, err: &ServiceError) {
        let _ = self.events.send(SessionEvent::Error(err.clone()));
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
