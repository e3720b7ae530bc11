//! Wire format of the deck API, shared by the local deck server and the HTTP adapter.
//!
//! Every response carries `success`; failures replace the payload with `error`.
//! Payload fields are optional on the wire so a failure body decodes into the
//! same type as a success body.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDeckQuery {
    #[serde(default)]
    pub deck_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawQuery {
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardImages {
    pub svg: String,
    pub png: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPayload {
    pub code: String,
    pub image: String,
    pub images: CardImages,
    pub value: String,
    pub suit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShuffleResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<String>,
    #[serde(default)]
    pub shuffled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShuffleResponse {
    pub fn shuffled(deck_id: impl Into<String>, remaining: u32) -> Self {
        Self {
            success: true,
            deck_id: Some(deck_id.into()),
            shuffled: true,
            remaining: Some(remaining),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            deck_id: None,
            shuffled: false,
            remaining: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_id: Option<String>,
    #[serde(default)]
    pub cards: Vec<CardPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DrawResponse {
    pub fn drawn(deck_id: impl Into<String>, cards: Vec<CardPayload>, remaining: u32) -> Self {
        Self {
            success: true,
            deck_id: Some(deck_id.into()),
            cards,
            remaining: Some(remaining),
            error: None,
        }
    }

    pub fn failure(deck_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            deck_id,
            cards: Vec::new(),
            remaining: None,
            error: Some(error.into()),
        }
    }
}
