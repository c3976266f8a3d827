//! answerdb: answer a question by running the solution script of the nearest
//! known question.
//!
//! ```bash
//! answerdb serve [--host HOST] [--port PORT] [--rebuild]
//! answerdb ask "what is 2+2?"
//! answerdb index [--corpus-root DIR]
//! ```
//!
//! Settings come from `config.toml`, `config.<RUST_ENV>.toml`, `APP_*`
//! variables and `PORT`, in that order; flags override all of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use answerdb_core::config::{Config, Settings};
use answerdb_core::traits::Embedder;
use answerdb_embed::get_default_embedder;
use answerdb_service::{build_and_save, serve, IndexSources, QueryService};

#[derive(Parser, Debug)]
#[command(name = "answerdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Rebuild the index from the corpus even if a saved one is usable
        #[arg(long)]
        rebuild: bool,
    },

    /// Answer one question and print the result
    Ask {
        question: String,
    },

    /// Rebuild and save the index
    Index {
        /// Override corpus.root
        #[arg(long)]
        corpus_root: Option<PathBuf>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    Ok(Arc::from(get_default_embedder(&settings.embed)?))
}

async fn start_service(settings: Settings, base: PathBuf) -> Result<QueryService> {
    tokio::task::spawn_blocking(move || -> Result<QueryService> {
        let embedder = load_embedder(&settings)?;
        Ok(QueryService::start(&settings, &base, embedder)?)
    })
    .await?
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut settings = Config::load()?.settings()?;
    let base = std::env::current_dir()?;
    info!(corpus = %settings.corpus.root, index = %settings.index.path, "configuration loaded");

    match cli.command {
        Commands::Serve { host, port, rebuild } => {
            if let Some(host) = host { settings.server.host = host; }
            if let Some(port) = port { settings.server.port = port; }
            settings.index.rebuild_on_start |= rebuild;
            let (host, port) = (settings.server.host.clone(), settings.server.port);
            let service = start_service(settings, base).await?;
            serve(Arc::new(service), &host, port).await?;
        }
        Commands::Ask { question } => {
            let service = start_service(settings, base).await?;
            let answer = service.answer(&question).await?;
            println!("{}", answer.text());
        }
        Commands::Index { corpus_root } => {
            if let Some(root) = corpus_root { settings.corpus.root = root.display().to_string(); }
            tokio::task::spawn_blocking(move || index(&settings, &base)).await??;
        }
    }
    Ok(())
}

fn index(settings: &Settings, base: &Path) -> Result<()> {
    let sources = IndexSources::from_settings(settings, base);
    let embedder = load_embedder(settings)?;
    let (index, report) = build_and_save(&sources, embedder.as_ref())?;
    info!(
        indexed = report.indexed,
        skipped = report.skipped,
        embedder = index.embedder_id(),
        path = %sources.index_path.display(),
        "index written"
    );
    println!("indexed {} questions ({} skipped) into {}", report.indexed, report.skipped, sources.index_path.display());
    Ok(())
}
