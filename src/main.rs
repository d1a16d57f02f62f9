use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use narrative_graph::config::Config;
use narrative_graph::db::Database;

/// narrative-graph: coordinated-behavior detection and narrative risk scoring.
///
/// Reads posts already assigned to narratives, finds authors posting in
/// lockstep, and ranks narratives by how likely they are to be an
/// influence operation.
#[derive(Parser)]
#[command(name = "narrative-graph", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Analyze a JSONL file of posts and store the results
    Run {
        /// Path to the input file (one JSON post per line)
        #[arg(long)]
        input: PathBuf,

        /// Skip embedding; text similarity then comes only from vectors in the input
        #[arg(long)]
        no_embed: bool,

        /// Print plain-language explanations for narratives and groups
        #[arg(long)]
        explain: bool,
    },

    /// Show narrative risks from the latest run
    Report {
        /// Only include narratives at or above this risk score
        #[arg(long, default_value = "0")]
        min_score: f64,
    },

    /// Show coordination groups from the latest run
    Groups {
        /// Maximum number of groups to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Print an explanation for each group
        #[arg(long)]
        explain: bool,
    },

    /// Show system status (DB stats, last run)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("narrative_graph=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing narrative-graph database...");
            let config = load_config()?;
            let db = narrative_graph::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext step: narrative-graph run --input <posts.jsonl>");
        }

        Commands::Run {
            input,
            no_embed,
            explain,
        } => {
            let config = load_config()?;
            run_analysis(&config, &input, no_embed, explain).await?;
        }

        Commands::Report { min_score } => {
            let config = load_config()?;
            let db = narrative_graph::db::open_sqlite(&config.db_path)?;
            let risks = db.get_ranked_risks(min_score).await?;
            narrative_graph::output::terminal::display_risk_list(&risks);
        }

        Commands::Groups { limit, explain } => {
            let config = load_config()?;
            let db = narrative_graph::db::open_sqlite(&config.db_path)?;
            let groups = db.get_groups(limit).await?;
            narrative_graph::output::terminal::display_groups(&groups, None);
            if explain {
                for group in &groups {
                    let explanation = narrative_graph::explain::explain_group(group);
                    narrative_graph::output::terminal::display_explanation(&explanation, None);
                }
            }
        }

        Commands::Status => {
            let config = load_config()?;
            if narrative_graph::status::database_missing(&config.db_path) {
                println!("Database: not initialized");
                println!("\nRun `narrative-graph init` to set up the database.");
                return Ok(());
            }
            let db = narrative_graph::db::open_sqlite(&config.db_path)?;
            narrative_graph::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Load and validate configuration from the environment.
fn load_config() -> Result<Config> {
    let config = Config::load()?;
    config.validate()?;
    Ok(config)
}

async fn run_analysis(config: &Config, input: &Path, no_embed: bool, explain: bool) -> Result<()> {
    use narrative_graph::output::terminal;

    println!("Loading posts from {}...", input.display());
    let loaded = narrative_graph::ingest::load_jsonl(input)?;
    if !loaded.dead_letters.is_empty() {
        println!(
            "  {} {} malformed records skipped",
            "Warning:".yellow(),
            loaded.dead_letters.len()
        );
    }
    let posts = loaded.posts;
    if posts.is_empty() {
        println!("No valid posts found in {}.", input.display());
        return Ok(());
    }
    println!("  {} posts loaded", posts.len());

    let embeddings = if no_embed {
        None
    } else {
        let embedder = narrative_graph::embeddings::hashing::HashingEmbedder::default();
        Some(narrative_graph::pipeline::embedding::embed_posts(
            &embedder,
            &posts,
            narrative_graph::pipeline::embedding::DEFAULT_BATCH_SIZE,
            true,
        )?)
    };

    // Results are still shown when the database can't be opened
    let db: Option<Arc<dyn Database>> =
        match narrative_graph::db::initialize_sqlite(&config.db_path) {
            Ok(db) => Some(db),
            Err(e) => {
                warn!(error = %e, "Database unavailable, results will not be stored");
                None
            }
        };

    let run_input = narrative_graph::pipeline::RunInput {
        input_path: Some(input.display().to_string()),
        dead_letter_count: loaded.dead_letters.len(),
    };
    let outcome = narrative_graph::pipeline::run(
        &posts,
        embeddings.as_deref(),
        config,
        db.as_deref(),
        &run_input,
    )
    .await;

    println!("\n{}", "Analysis complete.".bold());
    println!("  Narratives: {}", outcome.narratives.len());
    println!("  Coordinated pairs: {}", outcome.pairs.len());
    println!("  Coordination groups: {}", outcome.groups.len());

    terminal::display_risk_list(&outcome.risks);
    terminal::display_groups(&outcome.groups, Some(outcome.pairs.as_slice()));
    if !outcome.pairs.is_empty() {
        let summary = narrative_graph::coordination::report::summarize(&outcome.pairs, &outcome.groups);
        terminal::display_evidence_summary(&summary);
        terminal::display_top_pairs(&outcome.pairs, 5);
    }

    if explain {
        for risk in &outcome.risks {
            if let Some(narrative) = outcome.narratives.iter().find(|n| n.id == risk.narrative_id) {
                let explanation = narrative_graph::explain::explain_narrative(narrative, risk);
                terminal::display_explanation(&explanation, Some(risk.risk_level));
            }
        }
        for group in &outcome.groups {
            let explanation = narrative_graph::explain::explain_group(group);
            terminal::display_explanation(&explanation, None);
        }
    }

    match (outcome.run_id, &outcome.persist_error) {
        (Some(run_id), _) => println!("\nResults stored as run #{run_id} in {}", config.db_path),
        (None, Some(err)) => println!("\n{} results were not stored: {err}", "Warning:".yellow()),
        (None, None) => {}
    }

    Ok(())
}
