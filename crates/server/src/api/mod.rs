use rand::seq::SliceRandom;
use shared::{
    domain::{standard_deck_codes, CardFace},
    error::ApiError,
    protocol::{CardImages, CardPayload, DrawResponse, ShuffleResponse},
};
use storage::{Storage, TakeOutcome};
use tracing::info;

pub const MAX_DECK_COUNT: u32 = 20;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
    pub image_base_url: String,
}

pub fn new_deck_route() -> &'static str {
    "/api/deck/new/shuffle/"
}

pub fn draw_route() -> &'static str {
    "/api/deck/:deck_id/draw/"
}

pub async fn new_shuffled_deck(
    ctx: &ApiContext,
    deck_count: Option<u32>,
) -> Result<ShuffleResponse, ApiError> {
    let deck_count = deck_count.unwrap_or(1);
    if !(1..=MAX_DECK_COUNT).contains(&deck_count) {
        return Err(ApiError::validation(format!(
            "deck_count must be between 1 and {MAX_DECK_COUNT}"
        )));
    }

    let codes = shuffled_codes(deck_count);
    let record = ctx.storage.create_deck(&codes).await.map_err(internal)?;
    info!(deck_id = %record.id, deck_count, "deck shuffled");

    Ok(ShuffleResponse::shuffled(
        record.id,
        record.deck.len() as u32,
    ))
}

pub async fn draw_cards(
    ctx: &ApiContext,
    deck_id: &str,
    count: Option<u32>,
) -> Result<DrawResponse, ApiError> {
    let count = count.unwrap_or(1);
    if count == 0 {
        return Err(ApiError::validation("count must be at least 1"));
    }

    match ctx
        .storage
        .take_cards(deck_id, count)
        .await
        .map_err(internal)?
    {
        TakeOutcome::Taken { cards, remaining } => {
            let cards = cards
                .iter()
                .map(|code| card_payload(&ctx.image_base_url, code))
                .collect::<Result<Vec<_>, _>>()?;
            info!(%deck_id, drawn = cards.len(), remaining, "cards drawn");
            Ok(DrawResponse::drawn(deck_id, cards, remaining))
        }
        TakeOutcome::NotFound => Err(ApiError::not_found("Deck ID does not exist.")),
        TakeOutcome::Insufficient { remaining } => Err(ApiError::validation(format!(
            "Not enough cards remaining to draw {count} additional ({remaining} left)"
        ))),
    }
}

pub fn card_payload(image_base_url: &str, code: &str) -> Result<CardPayload, ApiError> {
    let face = CardFace::parse(code)
        .ok_or_else(|| ApiError::internal(format!("stored deck holds unknown card code '{code}'")))?;
    let base = image_base_url.trim_end_matches('/');
    let png = format!("{base}/{code}.png");

    Ok(CardPayload {
        code: code.to_string(),
        image: png.clone(),
        images: CardImages {
            svg: format!("{base}/{code}.svg"),
            png,
        },
        value: face.rank.name().to_string(),
        suit: face.suit.name().to_string(),
    })
}

fn shuffled_codes(deck_count: u32) -> Vec<String> {
    let mut codes = standard_deck_codes(deck_count);
    codes.shuffle(&mut rand::thread_rng());
    codes
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::internal(err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
