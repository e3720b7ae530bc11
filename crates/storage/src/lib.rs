use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;
use uuid::Uuid;

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Persisted deck: the undealt card codes of one shuffled deck, top card first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckRecord {
    pub id: String,
    pub deck: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeOutcome {
    Taken { cards: Vec<String>, remaining: u32 },
    NotFound,
    Insufficient { remaining: u32 },
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every in-memory connection is its own database, so pin the pool to one.
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(connect_options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_deck(&self, cards: &[String]) -> Result<DeckRecord> {
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        sqlx::query("INSERT INTO decks (id, deck, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(encode_cards(cards)?)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("failed to insert deck record")?;
        debug!(deck_id = %id, cards = cards.len(), "storage: deck record created");

        Ok(DeckRecord {
            id,
            deck: cards.to_vec(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn fetch_deck(&self, id: &str) -> Result<Option<DeckRecord>> {
        let row = sqlx::query("SELECT id, deck, created_at, updated_at FROM decks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> Result<DeckRecord> {
            Ok(DeckRecord {
                id: row.try_get("id")?,
                deck: decode_cards(&row.try_get::<String, _>("deck")?)?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })
        })
        .transpose()
    }

    /// Removes the top `count` cards of a deck in a single transaction.
    ///
    /// Takes the write lock up front (`BEGIN IMMEDIATE`); concurrent draws on a
    /// file-backed deck wait on the busy timeout.
    pub async fn take_cards(&self, id: &str, count: u32) -> Result<TakeOutcome> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .context("failed to lock deck table")?;

        let outcome = take_cards_locked(&mut conn, id, count).await;
        let finish = match outcome {
            Ok(TakeOutcome::Taken { .. }) => "COMMIT",
            _ => "ROLLBACK",
        };
        sqlx::query(finish)
            .execute(&mut *conn)
            .await
            .with_context(|| format!("failed to {} deck update", finish.to_lowercase()))?;
        outcome
    }
}

async fn take_cards_locked(
    conn: &mut SqliteConnection,
    id: &str,
    count: u32,
) -> Result<TakeOutcome> {
    let row = sqlx::query("SELECT deck FROM decks WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(row) = row else {
        return Ok(TakeOutcome::NotFound);
    };

    let mut deck = decode_cards(&row.try_get::<String, _>("deck")?)?;
    let count = count as usize;
    if count > deck.len() {
        return Ok(TakeOutcome::Insufficient {
            remaining: deck.len() as u32,
        });
    }

    let cards: Vec<String> = deck.drain(..count).collect();
    sqlx::query("UPDATE decks SET deck = ?, updated_at = ? WHERE id = ?")
        .bind(encode_cards(&deck)?)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("failed to update deck record")?;

    Ok(TakeOutcome::Taken {
        cards,
        remaining: deck.len() as u32,
    })
}

fn encode_cards(cards: &[String]) -> Result<String> {
    serde_json::to_string(cards).context("failed to encode deck cards")
}

fn decode_cards(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).context("stored deck is not a JSON array of card codes")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(parent) = sqlite_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "failed to create directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
