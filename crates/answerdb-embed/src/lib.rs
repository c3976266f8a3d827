//! Embedding providers for answerdb.
//!
//! `MiniLmEmbedder` runs all-MiniLM-L6-v2 (BERT, 384 dims) locally with candle.
//! `FakeEmbedder` hashes tokens into a fixed-size, L2-normalized vector and is
//! used by tests and by `APP_USE_FAKE_EMBEDDINGS=1`.

mod device;
mod pool;
mod tokenize;

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::time::Instant;

use answerdb_core::config::{expand_path, EmbedSettings};
use answerdb_core::traits::Embedder;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

pub const MINILM_DIM: usize = 384;
const MAX_SEQ_LEN: usize = 256;

pub struct MiniLmEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, id: String }

impl MiniLmEmbedder {
    pub fn new(model_dir: &Path) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading all-MiniLM-L6-v2");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let id = format!("minilm:all-MiniLM-L6-v2:d{}", MINILM_DIM);
        info!(id = %id, "embedding model loaded");
        Ok(Self { model, tokenizer, device, id })
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
    }
    Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

impl Embedder for MiniLmEmbedder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { MINILM_DIM }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, MAX_SEQ_LEN, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != MINILM_DIM {
            return Err(anyhow!("model produced {} dims, expected {}", emb.len(), MINILM_DIM));
        }
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 { warn!(elapsed_ms = elapsed.as_millis() as u64, "slow embedding"); }
        Ok(emb)
    }
}

/// Deterministic token-hash embedder. Texts sharing words share dimensions, so
/// nearest-neighbour behaviour is meaningful enough for tests.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:xxhash64:d{}", dim) } }
}

impl Embedder for FakeEmbedder {
    fn id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use std::hash::{Hash, Hasher}; use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let token = token.to_lowercase();
            let mut hasher = XxHash64::with_seed(0); token.hash(&mut hasher); let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; }
        Ok(v)
    }
}

/// Pick the embedder from configuration. `APP_USE_FAKE_EMBEDDINGS=1` wins over
/// the config file so tests never load the real model.
pub fn get_default_embedder(settings: &EmbedSettings) -> Result<Box<dyn Embedder>> {
    let env_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if env_fake || settings.use_fake {
        info!(dim = settings.fake_dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.fake_dim.max(1))));
    }
    let model_dir = resolve_model_dir(settings)?;
    Ok(Box::new(MiniLmEmbedder::new(&model_dir)?))
}

fn resolve_model_dir(settings: &EmbedSettings) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = expand_path(&dir); if p.exists() { debug!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); } }
    let configured = expand_path(&settings.model_dir);
    if configured.exists() { return Ok(configured); }
    Err(anyhow!("Could not locate embedding model directory (tried APP_MODEL_DIR and {})", configured.display()))
}
