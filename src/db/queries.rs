// Database queries — reads and writes for runs and their results.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.
// Structured fields (evidence, components, ID lists) are stored as JSON text.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{NewRun, RunSummary};
use crate::models::{CoordinatedGroup, CoordinatedPair, NarrativeRisk, RiskLevel};

// --- Runs ---

/// Record a run and return its ID. The run stays hidden from readers until
/// `complete_run` is called for it.
pub fn record_run(conn: &Connection, run: &NewRun) -> Result<i64> {
    conn.execute(
        "INSERT INTO runs
            (input_path, post_count, dead_letter_count, narrative_count,
             pair_count, group_count, high_risk_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            run.input_path,
            run.post_count as i64,
            run.dead_letter_count as i64,
            run.narrative_count as i64,
            run.pair_count as i64,
            run.group_count as i64,
            run.high_risk_count as i64,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Mark a run's results as fully written.
pub fn complete_run(conn: &Connection, run_id: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE runs SET completed_at = datetime('now') WHERE id = ?1",
        params![run_id],
    )?;
    if updated == 0 {
        anyhow::bail!("No run with ID {run_id}");
    }
    Ok(())
}

/// The most recent completed run, if any.
pub fn latest_run(conn: &Connection) -> Result<Option<RunSummary>> {
    let mut stmt = conn.prepare(
        "SELECT id, started_at, input_path, post_count, dead_letter_count,
                narrative_count, pair_count, group_count, high_risk_count
         FROM runs
         WHERE completed_at IS NOT NULL
         ORDER BY id DESC LIMIT 1",
    )?;
    let run = stmt
        .query_row([], |row| {
            Ok(RunSummary {
                id: row.get(0)?,
                started_at: row.get(1)?,
                input_path: row.get(2)?,
                post_count: row.get::<_, i64>(3)? as usize,
                dead_letter_count: row.get::<_, i64>(4)? as usize,
                narrative_count: row.get::<_, i64>(5)? as usize,
                pair_count: row.get::<_, i64>(6)? as usize,
                group_count: row.get::<_, i64>(7)? as usize,
                high_risk_count: row.get::<_, i64>(8)? as usize,
            })
        })
        .optional()?;
    Ok(run)
}

fn latest_run_id(conn: &Connection) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT MAX(id) FROM runs WHERE completed_at IS NOT NULL",
            [],
            |row| row.get::<_, Option<i64>>(0),
        )?;
    Ok(id)
}

// --- Results ---

/// Store a run's coordinated pairs in one transaction.
pub fn save_pairs(conn: &Connection, run_id: i64, pairs: &[CoordinatedPair]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO coordinated_pairs
                (run_id, narrative_id, author1_id, author2_id, score, evidence)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for pair in pairs {
            let evidence = serde_json::to_string(&pair.evidence)?;
            stmt.execute(params![
                run_id,
                pair.narrative_id,
                pair.author1_id,
                pair.author2_id,
                pair.score,
                evidence,
            ])?;
        }
    }
    tx.commit().context("Failed to commit coordinated pairs")?;
    Ok(())
}

/// Store a run's groups, keeping their ranked order.
pub fn save_groups(conn: &Connection, run_id: i64, groups: &[CoordinatedGroup]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO coordinated_groups
                (run_id, group_id, position, score, size, author_ids, narrative_ids, evidence_summary)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(run_id, group_id) DO UPDATE SET
                position = ?3, score = ?4, size = ?5, author_ids = ?6,
                narrative_ids = ?7, evidence_summary = ?8",
        )?;
        for (position, group) in groups.iter().enumerate() {
            stmt.execute(params![
                run_id,
                group.id,
                position as i64,
                group.score,
                group.size as i64,
                serde_json::to_string(&group.author_ids)?,
                serde_json::to_string(&group.narrative_ids)?,
                group.evidence_summary,
            ])?;
        }
    }
    tx.commit().context("Failed to commit coordinated groups")?;
    Ok(())
}

/// Store a run's narrative risk assessments.
pub fn save_risks(conn: &Connection, run_id: i64, risks: &[NarrativeRisk]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO narrative_risks
                (run_id, narrative_id, risk_score, risk_level, components, reasons)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(run_id, narrative_id) DO UPDATE SET
                risk_score = ?3, risk_level = ?4, components = ?5, reasons = ?6",
        )?;
        for risk in risks {
            stmt.execute(params![
                run_id,
                risk.narrative_id,
                risk.risk_score,
                risk.risk_level.as_str(),
                serde_json::to_string(&risk.components)?,
                serde_json::to_string(&risk.reasons)?,
            ])?;
        }
    }
    tx.commit().context("Failed to commit narrative risks")?;
    Ok(())
}

/// Risks from the latest run at or above `min_score`, highest first.
/// Ties keep the order they were saved in.
pub fn get_ranked_risks(conn: &Connection, min_score: f64) -> Result<Vec<NarrativeRisk>> {
    let Some(run_id) = latest_run_id(conn)? else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare(
        "SELECT narrative_id, risk_score, risk_level, components, reasons
         FROM narrative_risks
         WHERE run_id = ?1 AND risk_score >= ?2
         ORDER BY risk_score DESC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![run_id, min_score], |row| {
        let level: String = row.get(2)?;
        let components: String = row.get(3)?;
        let reasons: String = row.get(4)?;
        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?, level, components, reasons))
    })?;

    let mut risks = Vec::new();
    for row in rows {
        let (narrative_id, risk_score, level, components, reasons) = row?;
        risks.push(NarrativeRisk {
            components: serde_json::from_str(&components)
                .with_context(|| format!("Corrupt components for {narrative_id}"))?,
            reasons: serde_json::from_str(&reasons)
                .with_context(|| format!("Corrupt reasons for {narrative_id}"))?,
            risk_level: RiskLevel::parse(&level),
            narrative_id,
            risk_score,
        });
    }
    Ok(risks)
}

/// Up to `limit` groups from the latest run, in ranked order.
pub fn get_groups(conn: &Connection, limit: u32) -> Result<Vec<CoordinatedGroup>> {
    let Some(run_id) = latest_run_id(conn)? else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare(
        "SELECT group_id, author_ids, score, evidence_summary, narrative_ids, size
         FROM coordinated_groups
         WHERE run_id = ?1
         ORDER BY position ASC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![run_id, limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, f64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
        ))
    })?;

    let mut groups = Vec::new();
    for row in rows {
        let (id, author_ids, score, evidence_summary, narrative_ids, size) = row?;
        groups.push(CoordinatedGroup {
            author_ids: serde_json::from_str(&author_ids)
                .with_context(|| format!("Corrupt author list for {id}"))?,
            narrative_ids: serde_json::from_str(&narrative_ids)
                .with_context(|| format!("Corrupt narrative list for {id}"))?,
            id,
            score,
            evidence_summary,
            size: size as usize,
        });
    }
    Ok(groups)
}

/// Number of pairs stored for a run.
pub fn count_pairs(conn: &Connection, run_id: i64) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM coordinated_pairs WHERE run_id = ?1",
        params![run_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use crate::models::{CoordinationEvidence, RiskComponents};

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn risk(id: &str, score: f64) -> NarrativeRisk {
        NarrativeRisk {
            narrative_id: id.to_string(),
            risk_score: score,
            risk_level: RiskLevel::from_score(score, 0.6, 0.8),
            components: RiskComponents {
                velocity: score,
                ..Default::default()
            },
            reasons: vec![format!("reason for {id}")],
        }
    }

    fn group(id: &str, score: f64) -> CoordinatedGroup {
        CoordinatedGroup {
            id: id.to_string(),
            author_ids: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            score,
            evidence_summary: "Group of 3 authors".to_string(),
            narrative_ids: vec!["n1".to_string()],
            size: 3,
        }
    }

    #[test]
    fn test_empty_database_reads_nothing() {
        let conn = test_db();
        assert!(latest_run(&conn).unwrap().is_none());
        assert!(get_ranked_risks(&conn, 0.0).unwrap().is_empty());
        assert!(get_groups(&conn, 10).unwrap().is_empty());
    }

    #[test]
    fn test_run_roundtrip() {
        let conn = test_db();
        let id = record_run(
            &conn,
            &NewRun {
                input_path: Some("posts.jsonl".to_string()),
                post_count: 40,
                dead_letter_count: 2,
                narrative_count: 3,
                pair_count: 5,
                group_count: 1,
                high_risk_count: 1,
            },
        )
        .unwrap();
        assert!(latest_run(&conn).unwrap().is_none());

        complete_run(&conn, id).unwrap();
        let run = latest_run(&conn).unwrap().unwrap();
        assert_eq!(run.id, id);
        assert_eq!(run.post_count, 40);
        assert_eq!(run.dead_letter_count, 2);
        assert_eq!(run.input_path.as_deref(), Some("posts.jsonl"));
    }

    #[test]
    fn test_ranked_risks_filter_and_order() {
        let conn = test_db();
        let run_id = record_run(&conn, &NewRun::default()).unwrap();
        save_risks(&conn, run_id, &[risk("n1", 0.85), risk("n2", 0.2), risk("n3", 0.65)]).unwrap();
        complete_run(&conn, run_id).unwrap();

        let ranked = get_ranked_risks(&conn, 0.5).unwrap();
        let ids: Vec<&str> = ranked.iter().map(|r| r.narrative_id.as_str()).collect();
        assert_eq!(ids, vec!["n1", "n3"]);
        assert_eq!(ranked[0].risk_level, RiskLevel::High);
        assert_eq!(ranked[1].reasons, vec!["reason for n3".to_string()]);
        assert!((ranked[0].components.velocity - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reads_only_latest_run() {
        let conn = test_db();
        let first = record_run(&conn, &NewRun::default()).unwrap();
        save_groups(&conn, first, &[group("coord_group_0000", 0.9)]).unwrap();
        save_risks(&conn, first, &[risk("old", 0.9)]).unwrap();
        complete_run(&conn, first).unwrap();

        let second = record_run(&conn, &NewRun::default()).unwrap();
        save_risks(&conn, second, &[risk("new", 0.4)]).unwrap();
        complete_run(&conn, second).unwrap();

        let ranked = get_ranked_risks(&conn, 0.0).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].narrative_id, "new");
        assert!(get_groups(&conn, 10).unwrap().is_empty());
    }

    #[test]
    fn test_unfinished_run_is_invisible() {
        let conn = test_db();
        let first = record_run(&conn, &NewRun::default()).unwrap();
        save_groups(&conn, first, &[group("coord_group_0000", 0.9)]).unwrap();
        save_risks(&conn, first, &[risk("old", 0.9)]).unwrap();
        complete_run(&conn, first).unwrap();

        // Groups written, risks never were
        let second = record_run(&conn, &NewRun::default()).unwrap();
        save_groups(&conn, second, &[group("coord_group_0000", 0.5)]).unwrap();

        assert_eq!(latest_run(&conn).unwrap().unwrap().id, first);
        let ranked = get_ranked_risks(&conn, 0.0).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].narrative_id, "old");
        assert_eq!(get_groups(&conn, 10).unwrap()[0].score, 0.9);
    }

    #[test]
    fn test_complete_unknown_run_fails() {
        let conn = test_db();
        assert!(complete_run(&conn, 42).is_err());
    }

    #[test]
    fn test_groups_keep_saved_order_and_limit() {
        let conn = test_db();
        let run_id = record_run(&conn, &NewRun::default()).unwrap();
        save_groups(
            &conn,
            run_id,
            &[
                group("coord_group_0001", 0.97),
                group("coord_group_0000", 0.9),
                group("coord_group_0002", 0.86),
            ],
        )
        .unwrap();
        complete_run(&conn, run_id).unwrap();

        let groups = get_groups(&conn, 2).unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["coord_group_0001", "coord_group_0000"]);
        assert_eq!(groups[0].author_ids, vec!["a", "b", "c"]);
        assert_eq!(groups[0].size, 3);
    }

    #[test]
    fn test_pairs_saved_with_evidence() {
        let conn = test_db();
        let run_id = record_run(&conn, &NewRun::default()).unwrap();
        let pair = CoordinatedPair {
            author1_id: "a".to_string(),
            author2_id: "b".to_string(),
            score: 0.9,
            evidence: CoordinationEvidence {
                post_ids: vec!["p1".to_string(), "p2".to_string()],
                shared_domains: vec!["news.ru".to_string()],
                ..Default::default()
            },
            narrative_id: "n1".to_string(),
        };
        save_pairs(&conn, run_id, &[pair.clone(), pair]).unwrap();
        assert_eq!(count_pairs(&conn, run_id).unwrap(), 2);

        let evidence: String = conn
            .query_row("SELECT evidence FROM coordinated_pairs LIMIT 1", [], |row| row.get(0))
            .unwrap();
        let parsed: CoordinationEvidence = serde_json::from_str(&evidence).unwrap();
        assert_eq!(parsed.shared_domains, vec!["news.ru"]);
    }
}
