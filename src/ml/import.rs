// ============================================================
// Layer 5 — Pretrained Weight Import
// ============================================================
// Copies a GPT-2 `model.safetensors` from the hub into a freshly
// initialised Gpt2Model, tensor by tensor.
//
// Hub checkpoints name tensors either bare ("h.0.ln_1.weight")
// or under a "transformer." prefix, depending on which class
// saved them; both are accepted. Extra tensors (lm_head.weight,
// attn.bias mask buffers) are ignored: the LM head is tied to wte
// and the causal mask is built on the fly.
//
// Every tensor is shape-checked against Gpt2Config before use.

use anyhow::{anyhow, bail, Context, Result};
use burn::{module::Param, nn::Linear, prelude::*};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};
use std::{fs, path::Path};

use crate::ml::model::{Gpt2Config, Gpt2Model, LayerNorm};

const NAME_PREFIXES: [&str; 2] = ["", "transformer."];

/// Build a Gpt2Model on `device` from a safetensors file.
pub fn load_gpt2_safetensors<B: Backend>(
    config: &Gpt2Config,
    path:   &Path,
    device: &B::Device,
) -> Result<Gpt2Model<B>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read weights '{}'", path.display()))?;
    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| anyhow!("Invalid safetensors file '{}': {e}", path.display()))?;

    let weights = WeightSource::<B> { tensors, device };
    let d = config.n_embd;

    let mut model: Gpt2Model<B> = config.init(device);

    model.wte.weight = weights.param("wte.weight", [config.vocab_size, d])?;
    model.wpe.weight = weights.param("wpe.weight", [config.n_positions, d])?;

    for (i, block) in model.blocks.iter_mut().enumerate() {
        let p = format!("h.{i}");
        weights.layer_norm(&mut block.ln_1, &format!("{p}.ln_1"), d)?;
        weights.linear(&mut block.attn.c_attn, &format!("{p}.attn.c_attn"), d, 3 * d)?;
        weights.linear(&mut block.attn.c_proj, &format!("{p}.attn.c_proj"), d, d)?;
        weights.layer_norm(&mut block.ln_2, &format!("{p}.ln_2"), d)?;
        weights.linear(&mut block.mlp.c_fc, &format!("{p}.mlp.c_fc"), d, 4 * d)?;
        weights.linear(&mut block.mlp.c_proj, &format!("{p}.mlp.c_proj"), 4 * d, d)?;
    }

    weights.layer_norm(&mut model.ln_f, "ln_f", d)?;

    tracing::info!(
        "Imported {} layers from '{}' ({} parameters)",
        config.n_layer,
        path.display(),
        model.num_params()
    );
    Ok(model)
}

struct WeightSource<'a, B: Backend> {
    tensors: SafeTensors<'a>,
    device:  &'a B::Device,
}

impl<'a, B: Backend> WeightSource<'a, B> {
    fn view(&self, name: &str) -> Result<TensorView<'_>> {
        NAME_PREFIXES
            .iter()
            .find_map(|prefix| self.tensors.tensor(&format!("{prefix}{name}")).ok())
            .ok_or_else(|| anyhow!("Pretrained weights are missing tensor '{name}'"))
    }

    fn tensor<const D: usize>(&self, name: &str, shape: [usize; D]) -> Result<Tensor<B, D>> {
        let view = self.view(name)?;

        if view.shape() != shape.as_slice() {
            bail!(
                "Tensor '{name}' has shape {:?}, expected {:?}",
                view.shape(),
                shape
            );
        }

        let values: Vec<f32> = match view.dtype() {
            Dtype::F32 => view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            other => bail!("Tensor '{name}' has unsupported dtype {other:?} (expected F32)"),
        };

        Ok(Tensor::from_data(TensorData::new(values, shape), self.device))
    }

    fn param<const D: usize>(&self, name: &str, shape: [usize; D]) -> Result<Param<Tensor<B, D>>> {
        Ok(Param::from_tensor(self.tensor(name, shape)?))
    }

    fn linear(&self, linear: &mut Linear<B>, prefix: &str, d_in: usize, d_out: usize) -> Result<()> {
        linear.weight = self.param(&format!("{prefix}.weight"), [d_in, d_out])?;
        linear.bias   = Some(self.param(&format!("{prefix}.bias"), [d_out])?);
        Ok(())
    }

    fn layer_norm(&self, norm: &mut LayerNorm<B>, prefix: &str, d: usize) -> Result<()> {
        norm.gamma = self.param(&format!("{prefix}.weight"), [d])?;
        norm.beta  = self.param(&format!("{prefix}.bias"), [d])?;
        Ok(())
    }
}
