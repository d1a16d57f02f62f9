// System status display — DB size, last run, stored result counts.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);
    println!("Tables: {}", db.table_count().await?);

    match db.latest_run().await? {
        Some(run) => {
            println!(
                "Last completed run: #{} at {} ({})",
                run.id,
                run.started_at,
                run.input_path.as_deref().unwrap_or("no input file")
            );
            println!(
                "  Posts: {} loaded, {} skipped",
                run.post_count, run.dead_letter_count
            );
            println!("  Narratives: {}", run.narrative_count);
            println!(
                "  Coordination: {} pairs in {} groups",
                run.pair_count, run.group_count
            );
            println!("  High-risk narratives: {}", run.high_risk_count);
        }
        None => {
            println!("Last run: never");
            println!("  Run `narrative-graph run --input <file>` to analyze posts");
        }
    }

    Ok(())
}

/// True when there is no database file to report on.
pub fn database_missing(db_path: &str) -> bool {
    !Path::new(db_path).exists()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
