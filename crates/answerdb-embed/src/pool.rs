use anyhow::{Result, ensure};
use candle_core::{DType, Tensor};

/// Sentence embedding from BERT token states: mean over the real tokens,
/// then L2 normalization. This is the pooling all-MiniLM-L6-v2 was trained
/// with.
///
/// - `hidden` is the last hidden layer, `[B, T, H]`.
/// - `attention_mask` is `[B, T]`, 1 for real tokens and 0 for padding, with
///   the same `T` as `hidden`. Padding positions never contribute.
/// - Each returned row (`[B, H]`) has unit length, which is what lets the
///   matcher's raw dot product act as cosine similarity.
/// - A row whose mask is all zeros comes back as a zero vector, not NaN.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    ensure!(dims.len() == 3, "hidden shape must be [B,T,H], got {:?}", dims);
    let batch = dims[0];
    let hidden_dim = dims[2];

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape())?;
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.clamp(1e-9, f64::MAX)?;
    let mut mean = sum.broadcast_div(&lengths)?;
    let eps_val = match hidden.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(0)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = norm.broadcast_add(&eps)?;
    mean = mean.broadcast_div(&norm)?;
    ensure!(mean.dims() == [batch, hidden_dim], "pooled shape mismatch: {:?}", mean.dims());
    Ok(mean)
}
