use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("embeddings.json"));
    let index = answerdb_index::load(&path)?;
    println!("index: {}", path.display());
    println!("entries={} dimension={} embedder={} built_at={}", index.len(), index.dimension(), index.embedder_id(), index.built_at());
    let unsolved = index.entries().filter(|e| e.solution_reference.is_none()).count();
    println!("without solution: {}", unsolved);
    Ok(())
}
