// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{NewRun, RunSummary};
use super::traits::Database;
use crate::models::{CoordinatedGroup, CoordinatedPair, NarrativeRisk};

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn record_run(&self, run: &NewRun) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::record_run(&conn, run)
    }

    async fn complete_run(&self, run_id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::complete_run(&conn, run_id)
    }

    async fn latest_run(&self) -> Result<Option<RunSummary>> {
        let conn = self.conn.lock().await;
        super::queries::latest_run(&conn)
    }

    async fn save_pairs(&self, run_id: i64, pairs: &[CoordinatedPair]) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_pairs(&conn, run_id, pairs)
    }

    async fn save_groups(&self, run_id: i64, groups: &[CoordinatedGroup]) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_groups(&conn, run_id, groups)
    }

    async fn save_risks(&self, run_id: i64, risks: &[NarrativeRisk]) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_risks(&conn, run_id, risks)
    }

    async fn get_ranked_risks(&self, min_score: f64) -> Result<Vec<NarrativeRisk>> {
        let conn = self.conn.lock().await;
        super::queries::get_ranked_risks(&conn, min_score)
    }

    async fn get_groups(&self, limit: u32) -> Result<Vec<CoordinatedGroup>> {
        let conn = self.conn.lock().await;
        super::queries::get_groups(&conn, limit)
    }
}
