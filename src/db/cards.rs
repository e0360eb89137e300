//! Card CRUD and the transactional review operation

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result, TransactionBehavior};

use crate::domain::{Card, CardState, ReviewLog, ReviewOutcome};
use crate::srs::Scheduler;

use super::reviews::insert_review_log;

/// Error from the transactional review path. Missing and soft-deleted cards
/// are recoverable caller errors, not invariant violations.
#[derive(Debug)]
pub enum ReviewError {
    NotFound(i64),
    Deleted(i64),
    Db(rusqlite::Error),
}

impl std::fmt::Display for ReviewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "card {} not found", id),
            Self::Deleted(id) => write!(f, "card {} is deleted", id),
            Self::Db(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for ReviewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ReviewError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Db(e)
    }
}

pub fn insert_card(conn: &Connection, card: &Card) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO cards (owner_id, prompt, answer, state, stability, difficulty, reps, lapses,
                       last_review_at, next_review_at, scheduled_days, learning_step, deleted_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    "#,
        params![
            card.owner_id,
            card.prompt,
            card.answer,
            card.state.as_str(),
            card.stability,
            card.difficulty,
            card.reps,
            card.lapses,
            card.last_review_at.map(|dt| dt.to_rfc3339()),
            card.next_review_at.map(|dt| dt.to_rfc3339()),
            card.scheduled_days,
            card.learning_step,
            card.deleted_at.map(|dt| dt.to_rfc3339()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_card_by_id(conn: &Connection, id: i64) -> Result<Option<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, owner_id, prompt, answer, state, stability, difficulty, reps, lapses,
           last_review_at, next_review_at, scheduled_days, learning_step, deleted_at
    FROM cards WHERE id = ?1
    "#,
    )?;

    let mut rows = stmt.query(params![id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_card(row)?))
    } else {
        Ok(None)
    }
}

/// Active (not soft-deleted) cards for one owner: the snapshot the due-set
/// selector runs over.
pub fn list_owner_cards(conn: &Connection, owner_id: i64) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, owner_id, prompt, answer, state, stability, difficulty, reps, lapses,
           last_review_at, next_review_at, scheduled_days, learning_step, deleted_at
    FROM cards
    WHERE owner_id = ?1 AND deleted_at IS NULL
    ORDER BY id ASC
    "#,
    )?;

    let cards = stmt
        .query_map(params![owner_id], |row| row_to_card(row))?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Write every scheduling field in one statement. Content, ownership and the
/// soft-delete marker are not review outputs and stay untouched.
pub fn update_card_after_review(conn: &Connection, card: &Card) -> Result<()> {
    conn.execute(
        r#"
    UPDATE cards
    SET state = ?1, stability = ?2, difficulty = ?3, reps = ?4, lapses = ?5,
        last_review_at = ?6, next_review_at = ?7, scheduled_days = ?8, learning_step = ?9
    WHERE id = ?10
    "#,
        params![
            card.state.as_str(),
            card.stability,
            card.difficulty,
            card.reps,
            card.lapses,
            card.last_review_at.map(|dt| dt.to_rfc3339()),
            card.next_review_at.map(|dt| dt.to_rfc3339()),
            card.scheduled_days,
            card.learning_step,
            card.id,
        ],
    )?;
    Ok(())
}

/// Hide a card from scheduling. Only `deleted_at` changes; returns false if
/// the card was already deleted or does not exist.
pub fn soft_delete_card(conn: &Connection, card_id: i64, at: DateTime<Utc>) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE cards SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
        params![at.to_rfc3339(), card_id],
    )?;
    Ok(changed > 0)
}

/// Bring a soft-deleted card back, scheduling state intact.
pub fn restore_card(conn: &Connection, card_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE cards SET deleted_at = NULL WHERE id = ?1 AND deleted_at IS NOT NULL",
        params![card_id],
    )?;
    Ok(changed > 0)
}

/// The transactional read-modify-write the scheduler contract requires:
/// load, schedule, persist card and review log, commit. The immediate
/// transaction serializes mutation per card.
pub fn review_card_by_id(
    conn: &mut Connection,
    scheduler: &Scheduler,
    card_id: i64,
    outcome: &ReviewOutcome,
) -> std::result::Result<Card, ReviewError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let card = get_card_by_id(&tx, card_id)?.ok_or(ReviewError::NotFound(card_id))?;
    if card.is_deleted() {
        return Err(ReviewError::Deleted(card_id));
    }

    let updated = scheduler.review_card(&card, outcome);
    update_card_after_review(&tx, &updated)?;

    let log = ReviewLog::new(
        card_id,
        outcome.recall,
        outcome.answered_at,
        updated.scheduled_days,
        updated.state,
    );
    insert_review_log(&tx, &log)?;

    tx.commit()?;
    Ok(updated)
}

/// Convert a database row to a Card struct
pub(crate) fn row_to_card(row: &rusqlite::Row) -> Result<Card> {
    let state_str: String = row.get(4)?;

    Ok(Card {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        prompt: row.get(2)?,
        answer: row.get(3)?,
        state: CardState::from_str(&state_str),
        stability: row.get(5)?,
        difficulty: row.get(6)?,
        reps: row.get(7)?,
        lapses: row.get(8)?,
        last_review_at: parse_timestamp(row.get(9)?),
        next_review_at: parse_timestamp(row.get(10)?),
        scheduled_days: row.get(11)?,
        learning_step: row.get(12)?,
        deleted_at: parse_timestamp(row.get(13)?),
    })
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}
