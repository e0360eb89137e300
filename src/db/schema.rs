use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS cards (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      owner_id INTEGER NOT NULL,
      prompt TEXT NOT NULL,
      answer TEXT NOT NULL,
      state TEXT NOT NULL DEFAULT 'New',
      stability REAL,
      difficulty REAL,
      reps INTEGER NOT NULL DEFAULT 0,
      lapses INTEGER NOT NULL DEFAULT 0,
      last_review_at TEXT,
      next_review_at TEXT,
      scheduled_days REAL NOT NULL DEFAULT 0,
      learning_step INTEGER NOT NULL DEFAULT 0,
      deleted_at TEXT
    );

    CREATE TABLE IF NOT EXISTS review_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      card_id INTEGER NOT NULL,
      recall TEXT NOT NULL,
      reviewed_at TEXT NOT NULL,
      scheduled_days REAL NOT NULL DEFAULT 0,
      state TEXT NOT NULL,
      FOREIGN KEY (card_id) REFERENCES cards(id)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_cards_owner_id ON cards(owner_id);
    CREATE INDEX IF NOT EXISTS idx_cards_next_review_at ON cards(next_review_at);
    CREATE INDEX IF NOT EXISTS idx_cards_deleted_at ON cards(deleted_at);
    CREATE INDEX IF NOT EXISTS idx_review_logs_card_id ON review_logs(card_id);
    CREATE INDEX IF NOT EXISTS idx_review_logs_reviewed_at ON review_logs(reviewed_at);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: Add learning_step column (hybrid step-ladder scheduling)
  add_column_if_missing(conn, "cards", "learning_step", "INTEGER NOT NULL DEFAULT 0")?;

  // Migration: Add soft-delete marker
  add_column_if_missing(conn, "cards", "deleted_at", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_migrations_are_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();

    let count: i64 = conn
      .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))
      .unwrap();
    assert_eq!(count, 0);
  }

  #[test]
  fn test_migrations_add_missing_columns() {
    let conn = Connection::open_in_memory().unwrap();
    // Simulate a pre-soft-delete database
    conn
      .execute_batch(
        r#"
        CREATE TABLE cards (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          owner_id INTEGER NOT NULL,
          prompt TEXT NOT NULL,
          answer TEXT NOT NULL,
          state TEXT NOT NULL DEFAULT 'New',
          stability REAL,
          difficulty REAL,
          reps INTEGER NOT NULL DEFAULT 0,
          lapses INTEGER NOT NULL DEFAULT 0,
          last_review_at TEXT,
          next_review_at TEXT,
          scheduled_days REAL NOT NULL DEFAULT 0
        );
        "#,
      )
      .unwrap();

    run_migrations(&conn).unwrap();

    assert!(column_exists(&conn, "cards", "learning_step"));
    assert!(column_exists(&conn, "cards", "deleted_at"));
  }
}
