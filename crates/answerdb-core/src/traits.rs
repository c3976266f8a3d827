/// Text → vector function shared by index build and query time.
///
/// An index is only meaningful against the embedder that built it; `id`
/// identifies the model and dimension so persisted indexes can be checked
/// against the active embedder.
pub trait Embedder: Send + Sync {
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}
