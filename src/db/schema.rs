// Database schema — table creation and migrations.
//
// A `schema_version` table records which migrations have run. Result tables
// are keyed by run so history is kept across invocations.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Highest migration this build applies.
pub const SCHEMA_VERSION: i64 = 2;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per pipeline invocation
        CREATE TABLE IF NOT EXISTS runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            input_path TEXT,
            post_count INTEGER NOT NULL DEFAULT 0,
            dead_letter_count INTEGER NOT NULL DEFAULT 0,
            narrative_count INTEGER NOT NULL DEFAULT 0,
            pair_count INTEGER NOT NULL DEFAULT 0,
            group_count INTEGER NOT NULL DEFAULT 0,
            high_risk_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS coordinated_pairs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id INTEGER NOT NULL REFERENCES runs(id),
            narrative_id TEXT NOT NULL,
            author1_id TEXT NOT NULL,
            author2_id TEXT NOT NULL,
            score REAL NOT NULL,
            evidence TEXT NOT NULL             -- JSON CoordinationEvidence
        );

        CREATE TABLE IF NOT EXISTS coordinated_groups (
            run_id INTEGER NOT NULL REFERENCES runs(id),
            group_id TEXT NOT NULL,
            position INTEGER NOT NULL,         -- rank within the run
            score REAL NOT NULL,
            size INTEGER NOT NULL,
            author_ids TEXT NOT NULL,          -- JSON array
            narrative_ids TEXT NOT NULL,       -- JSON array
            evidence_summary TEXT NOT NULL,
            PRIMARY KEY (run_id, group_id)
        );

        CREATE TABLE IF NOT EXISTS narrative_risks (
            run_id INTEGER NOT NULL REFERENCES runs(id),
            narrative_id TEXT NOT NULL,
            risk_score REAL NOT NULL,
            risk_level TEXT NOT NULL,          -- LOW / MEDIUM / HIGH
            components TEXT NOT NULL,          -- JSON RiskComponents
            reasons TEXT NOT NULL,             -- JSON array
            PRIMARY KEY (run_id, narrative_id)
        );

        CREATE INDEX IF NOT EXISTS idx_pairs_run
            ON coordinated_pairs(run_id);

        CREATE INDEX IF NOT EXISTS idx_risks_score
            ON narrative_risks(run_id, risk_score);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: runs are only visible to readers once completed_at is
    // set, after all their results are written. Rows from before the column
    // existed count as complete.
    run_migration(conn, 2, |c| {
        c.execute_batch(
            "ALTER TABLE runs ADD COLUMN completed_at TEXT;
             UPDATE runs SET completed_at = started_at;",
        )
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
