//! # lexcorpus CLI (`lex`)
//!
//! The `lex` binary is the primary interface for lexcorpus. It provides
//! commands for corpus initialization, PDF extraction, embedding management,
//! semantic search, case retrieval, and starting the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! lex --config ./lexcorpus.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lex init` | Write a starter config and create the SQLite database |
//! | `lex extract` | Extract text and metadata from judgment PDFs |
//! | `lex embed pending` | Embed cases that have no vector yet |
//! | `lex embed rebuild` | Re-embed every case from scratch |
//! | `lex embed verify` | Report embedding coverage and a sample vector |
//! | `lex search "<query>"` | Rank the corpus against a free-text query |
//! | `lex similar <case-id>` | Find cases similar to a stored case |
//! | `lex get <case-id>` | Print one case record |
//! | `lex stats` | Corpus counters and coverage |
//! | `lex serve` | Start the JSON HTTP API |
//! | `lex completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # One-time setup
//! lex init
//!
//! # Pull text out of data/judgments
//! lex extract --source ./data/judgments
//!
//! # Embed whatever is not embedded yet
//! lex embed pending
//!
//! # Search with a court filter
//! lex search "anticipatory bail conditions" --court "Supreme Court" --top-k 5
//!
//! # Start the HTTP API on a non-default port
//! lex serve --port 8080
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lexcorpus::config;
use lexcorpus::embed_cmd;
use lexcorpus::embedding::{self, EmbeddingClient};
use lexcorpus::get;
use lexcorpus::ingest;
use lexcorpus::progress::ProgressMode;
use lexcorpus::search;
use lexcorpus::server;
use lexcorpus::stats;
use lexcorpus::store::sqlite::SqliteCaseStore;
use lexcorpus::store::CaseStore;

/// lexcorpus CLI: extraction and semantic retrieval for court judgments.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Run `lex init` once to write a commented starter config.
#[derive(Parser)]
#[command(
    name = "lex",
    about = "lexcorpus - extraction and semantic retrieval for court judgments",
    version,
    long_about = "lexcorpus turns a directory of judgment PDFs into a searchable corpus: \
    text is extracted through a chain of strategies, cleaned and mined for metadata, \
    embedded in resumable batches, and served through exact cosine-similarity search \
    from this CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./lexcorpus.toml`. All extraction, embedding, retrieval,
    /// and server settings are read from this file.
    #[arg(long, global = true, default_value = "./lexcorpus.toml")]
    config: PathBuf,

    /// Progress reporting on stderr: `auto`, `human`, `json`, or `off`.
    ///
    /// `auto` enables human-readable progress only when stderr is a TTY.
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Write a starter config and create the database.
    ///
    /// Writes a commented `lexcorpus.toml` next to the current directory
    /// (never overwriting an existing one) and creates the SQLite database
    /// with its schema and indexes. Idempotent.
    Init,

    /// Extract text and metadata from judgment PDFs.
    ///
    /// Walks the source directory, runs the extraction strategy chain on
    /// every matching PDF, cleans the text, derives metadata, and upserts
    /// one case record per document. Failures land in an error log instead
    /// of aborting the run.
    Extract {
        /// Source directory to scan (overrides `[extraction] source_dir`).
        #[arg(long)]
        source: Option<PathBuf>,

        /// Maximum number of documents to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Manage embedding vectors.
    ///
    /// Requires an embedding provider to be configured (`local`, `openai`,
    /// or `ollama`).
    Embed {
        #[command(subcommand)]
        action: EmbedAction,
    },

    /// Rank the corpus against a free-text query.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results (defaults to `[retrieval] top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Filter results to courts containing this substring (case-insensitive).
        #[arg(long)]
        court: Option<String>,

        /// Print results as pretty JSON instead of the human listing.
        #[arg(long)]
        json: bool,
    },

    /// Find cases similar to a stored case.
    ///
    /// Uses the stored case's own vector as the query, so no embedding
    /// provider is contacted.
    Similar {
        /// Case to find similar cases for.
        case_id: String,

        /// Maximum number of results (defaults to `[retrieval] top_k`).
        #[arg(long)]
        top_k: Option<usize>,

        /// Print results as pretty JSON instead of the human listing.
        #[arg(long)]
        json: bool,
    },

    /// Print one case record (metadata, counts, text).
    Get {
        /// Case identifier (the source file's stem).
        case_id: String,

        /// Print the record as pretty JSON.
        #[arg(long)]
        json: bool,
    },

    /// Corpus counters and embedding coverage.
    Stats {
        /// Print the counters as pretty JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start the JSON HTTP API.
    Serve {
        /// Bind host (overrides `[server] host`).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides `[server] port`).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate shell completions on stdout.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Embedding management subcommands.
#[derive(Subcommand)]
enum EmbedAction {
    /// Embed cases that have no vector yet.
    ///
    /// Resumable: already-embedded cases are left untouched, so an
    /// interrupted run picks up where it stopped.
    Pending {
        /// Maximum number of cases to embed in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the batch size from config (texts per provider call).
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Re-embed every case from scratch.
    ///
    /// Useful when switching embedding models or dimensions.
    Rebuild {
        /// Maximum number of cases to embed in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Override the batch size from config (texts per provider call).
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Report embedding coverage and a sample vector.
    Verify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require a loaded config
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "lex", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Init => {
            return run_init(&cli.config).await;
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;
    let mode = parse_progress(&cli.progress)?;

    let store: Arc<dyn CaseStore> = Arc::new(SqliteCaseStore::open(&cfg.store.db_path).await?);

    match cli.command {
        Commands::Init | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
        Commands::Extract { source, limit } => {
            let reporter = mode.reporter();
            ingest::run_extract(&cfg, store.clone(), source, limit, reporter.as_ref()).await?;
        }
        Commands::Embed { action } => match action {
            EmbedAction::Pending { limit, batch_size } => {
                let client = embedding::create_client(&cfg.embedding)?;
                let reporter = mode.reporter();
                embed_cmd::run_embed(
                    &cfg,
                    store.clone(),
                    client.as_ref(),
                    true,
                    limit,
                    batch_size,
                    reporter.as_ref(),
                )
                .await?;
            }
            EmbedAction::Rebuild { limit, batch_size } => {
                let client = embedding::create_client(&cfg.embedding)?;
                let reporter = mode.reporter();
                embed_cmd::run_embed(
                    &cfg,
                    store.clone(),
                    client.as_ref(),
                    false,
                    limit,
                    batch_size,
                    reporter.as_ref(),
                )
                .await?;
            }
            EmbedAction::Verify => {
                embed_cmd::run_embed_verify(store.clone()).await?;
            }
        },
        Commands::Search {
            query,
            top_k,
            court,
            json,
        } => {
            let client = embedding::create_client(&cfg.embedding)?;
            let top_k = top_k.unwrap_or(cfg.retrieval.top_k);
            let court = court.or_else(|| cfg.retrieval.court.clone());
            search::run_search(
                store.as_ref(),
                client.as_ref(),
                &query,
                top_k,
                court.as_deref(),
                json,
            )
            .await?;
        }
        Commands::Similar {
            case_id,
            top_k,
            json,
        } => {
            let top_k = top_k.unwrap_or(cfg.retrieval.top_k);
            search::run_similar(store.as_ref(), &case_id, top_k, None, json).await?;
        }
        Commands::Get { case_id, json } => {
            get::run_get(store.as_ref(), &case_id, json).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(store.as_ref(), &cfg, json).await?;
        }
        Commands::Serve { host, port } => {
            let mut cfg = cfg.clone();
            if let Some(host) = host {
                cfg.server.host = host;
            }
            if let Some(port) = port {
                cfg.server.port = port;
            }
            let client: Arc<dyn EmbeddingClient> =
                Arc::from(embedding::create_client(&cfg.embedding)?);
            server::run_server(&cfg, store.clone(), client).await?;
        }
    }

    store.close().await;
    Ok(())
}

/// Create the starter config (if missing) and the database schema.
async fn run_init(config_path: &Path) -> anyhow::Result<()> {
    let created = config::write_starter_config(config_path)?;
    let cfg = config::load_config(config_path)?;

    let store = SqliteCaseStore::open(&cfg.store.db_path).await?;
    store.ensure_indexes().await?;
    store.close().await;

    println!("init");
    println!(
        "  config: {} ({})",
        config_path.display(),
        if created { "created" } else { "exists" }
    );
    println!("  database: {}", cfg.store.db_path.display());
    println!("ok");
    Ok(())
}

fn parse_progress(mode: &str) -> anyhow::Result<ProgressMode> {
    match mode {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        "off" => Ok(ProgressMode::Off),
        other => anyhow::bail!(
            "unknown progress mode: '{}' (use auto, human, json, or off)",
            other
        ),
    }
}
