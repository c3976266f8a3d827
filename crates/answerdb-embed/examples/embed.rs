use answerdb_core::config::EmbedSettings;
use answerdb_embed::get_default_embedder;

fn main() -> anyhow::Result<()> {
    let embedder = get_default_embedder(&EmbedSettings::default())?;
    let texts = vec!["What is 2+2?".to_string(), "What is the capital of France?".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={} id={}", embs.len(), embedder.dim(), embedder.id());
    Ok(())
}
