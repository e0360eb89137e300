//! Review interaction log

use rusqlite::{params, Connection, Result};

use crate::domain::{CardState, Recall, ReviewLog};

pub fn insert_review_log(conn: &Connection, log: &ReviewLog) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_logs (card_id, recall, reviewed_at, scheduled_days, state)
    VALUES (?1, ?2, ?3, ?4, ?5)
    "#,
        params![
            log.card_id,
            log.recall.as_str(),
            log.reviewed_at.to_rfc3339(),
            log.scheduled_days,
            log.state.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent log entries for a card, newest first
pub fn list_card_logs(conn: &Connection, card_id: i64, limit: usize) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, card_id, recall, reviewed_at, scheduled_days, state
    FROM review_logs
    WHERE card_id = ?1
    ORDER BY reviewed_at DESC, id DESC
    LIMIT ?2
    "#,
    )?;

    let logs = stmt
        .query_map(params![card_id, limit as i64], |row| {
            let recall_str: String = row.get(2)?;
            let reviewed_at_str: String = row.get(3)?;
            let state_str: String = row.get(5)?;

            Ok(ReviewLog {
                id: row.get(0)?,
                card_id: row.get(1)?,
                recall: Recall::from_str(&recall_str).unwrap_or(Recall::Incorrect),
                reviewed_at: chrono::DateTime::parse_from_rfc3339(&reviewed_at_str)
                    .map(|dt| dt.with_timezone(&chrono::Utc))
                    .unwrap_or_default(),
                scheduled_days: row.get(4)?,
                state: CardState::from_str(&state_str),
            })
        })?
        .collect::<Result<Vec<_>>>()?;

    Ok(logs)
}
