use answerdb_core::config::EmbedSettings;
use answerdb_core::traits::Embedder;
use answerdb_embed::{get_default_embedder, FakeEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbedSettings { use_fake: true, fake_dim: 384, ..EmbedSettings::default() };

    let embedder = get_default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim is 384");
    assert_eq!(embedder.dim(), 384);
    assert_eq!(embedder.id(), "fake:xxhash64:d384");

    // Norm approximately 1.0
    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn fake_embedder_prefers_texts_sharing_words() {
    let embedder = FakeEmbedder::new(256);
    let query = embedder.embed("what is 2+2?").unwrap();
    let near = embedder.embed("What is 2+2?").unwrap();
    let far = embedder.embed("capital of France").unwrap();

    assert!(dot(&query, &near) > dot(&query, &far));
    assert!((dot(&query, &near) - 1.0).abs() < 1e-5, "case-insensitive tokens give identical vectors");
}

#[test]
fn empty_text_embeds_to_zero_vector_of_right_dim() {
    let embedder = FakeEmbedder::new(8);
    let v = embedder.embed("").unwrap();
    assert_eq!(v.len(), 8);
    assert!(v.iter().all(|x| *x == 0.0));
}
