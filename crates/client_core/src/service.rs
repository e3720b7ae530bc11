//! Deck service adapter: one remote call per operation, failures folded into [`ServiceError`].

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{DeckId, STANDARD_DECK_SIZE},
    protocol::{CardPayload, DrawResponse, ShuffleResponse},
};
use tracing::debug;
use url::Url;

use crate::error::ServiceError;

pub const DEFAULT_DECK_API_URL: &str = "https://deckofcardsapi.com/api";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeck {
    pub deck_id: DeckId,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawResult {
    pub card: CardPayload,
    pub remaining: u32,
}

/// Remote deck operations used by the session controller.
///
/// Implementations perform exactly one remote call per method, never retry
/// and keep no state about decks.
#[async_trait]
pub trait DeckService: Send + Sync {
    async fn request_new_deck(&self) -> Result<NewDeck, ServiceError>;
    async fn request_draw(&self, deck_id: &DeckId) -> Result<DrawResult, ServiceError>;
}

pub struct HttpDeckService {
    http: Client,
    base_url: Url,
}

impl HttpDeckService {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url.trim())
            .with_context(|| format!("invalid deck service url '{base_url}'"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "deck service url must use http or https, got '{}'",
                base_url.scheme()
            ));
        }
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("deck service url '{base_url}' cannot be a base"));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build deck service http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Transport(format!("unusable base url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            // trailing slash, as the deck API expects
            .push("");
        Ok(url)
    }
}

#[async_trait]
impl DeckService for HttpDeckService {
    async fn request_new_deck(&self) -> Result<NewDeck, ServiceError> {
        let url = self.endpoint(&["deck", "new", "shuffle"])?;
        debug!(%url, "deck service: requesting new shuffled deck");
        let response = self
            .http
            .get(url)
            .query(&[("deck_count", 1)])
            .send()
            .await?;
        let body: ShuffleResponse = decode_body(response).await?;

        if !body.success {
            return Err(rejection(body.error, "shuffle"));
        }
        let deck_id = body
            .deck_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ServiceError::Rejected("shuffle response is missing deck_id".into()))?;
        let remaining = checked_remaining(body.remaining)?;

        Ok(NewDeck {
            deck_id: DeckId(deck_id),
            remaining,
        })
    }

    async fn request_draw(&self, deck_id: &DeckId) -> Result<DrawResult, ServiceError> {
        let url = self.endpoint(&["deck", deck_id.as_str(), "draw"])?;
        debug!(%url, "deck service: drawing one card");
        let response = self.http.get(url).query(&[("count", 1)]).send().await?;
        let body: DrawResponse = decode_body(response).await?;

        if !body.success {
            return Err(rejection(body.error, "draw"));
        }
        let remaining = checked_remaining(body.remaining)?;
        let card = body
            .cards
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Rejected("draw response contained no cards".into()))?;

        Ok(DrawResult { card, remaining })
    }
}

/// Decodes the body regardless of status so service-reported failures keep their message.
async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    match serde_json::from_slice::<T>(&bytes) {
        Ok(body) => Ok(body),
        Err(_) if !status.is_success() => Err(ServiceError::Rejected(format!(
            "deck service answered HTTP {status}"
        ))),
        Err(err) => Err(ServiceError::Rejected(format!(
            "malformed deck service response: {err}"
        ))),
    }
}

fn rejection(error: Option<String>, operation: &str) -> ServiceError {
    ServiceError::Rejected(error.unwrap_or_else(|| format!("{operation} reported success=false")))
}

fn checked_remaining(remaining: Option<u32>) -> Result<u32, ServiceError> {
    match remaining {
        Some(remaining) if remaining <= STANDARD_DECK_SIZE => Ok(remaining),
        Some(remaining) => Err(ServiceError::Rejected(format!(
            "remaining count {remaining} exceeds a single deck"
        ))),
        None => Err(ServiceError::Rejected(
            "response is missing remaining count".into(),
        )),
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
