use std::env;

use answerdb_core::config::Config;
use answerdb_core::traits::Embedder;
use answerdb_embed::get_default_embedder;
use answerdb_service::{build_and_save, IndexSources};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")))
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut settings = config.settings()?;
    if let Some(root) = env::args().skip(1).find(|a| !a.starts_with('-')) {
        settings.corpus.root = root;
    }
    let base = env::current_dir()?;
    let sources = IndexSources::from_settings(&settings, &base);

    println!("Question Index Builder\n======================");
    println!("Corpus root: {}", sources.corpus_root.display());
    println!("Folders: {}", sources.layout.folders.join(", "));

    let embedder = get_default_embedder(&settings.embed)?;
    println!("Embedder: {} ({} dims)", embedder.id(), embedder.dim());
    let started = std::time::Instant::now();
    let (index, report) = build_and_save(&sources, embedder.as_ref())?;
    info!(indexed = report.indexed, skipped = report.skipped, elapsed_ms = started.elapsed().as_millis() as u64, "index build finished");

    println!("\n✅ Indexing completed successfully!");
    println!("📊 Indexed {} questions, skipped {}", report.indexed, report.skipped);
    println!("💾 Saved {} entries to {}", index.len(), sources.index_path.display());
    println!("\n💡 To ask a question, use: cargo run --bin answerdb -- ask '<question>'");
    Ok(())
}
