// ============================================================
// Layer 2 — TranslateUseCase
// ============================================================
// One translation turn:
//
//   modern text ─► build_prompt ─► Generator (greedy, penalty)
//               ─► extract_translation ─► cleaned sentence
//
// The model comes either from the latest retained checkpoint
// (`translate`) or straight out of a training run (`run`).

use anyhow::Result;
use burn::prelude::*;
use std::path::Path;

use crate::application::train_use_case::TrainedModel;
use crate::domain::{
    prompt::{build_prompt, extract_translation},
    traits::Translator,
};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::{
    generator::{GenerationConfig, Generator},
    InferBackend,
};

pub struct TranslateUseCase<B: Backend> {
    generator: Generator<B>,
}

impl<B: Backend> TranslateUseCase<B> {
    /// Rebuild the model from `model_config.json`, load the newest
    /// checkpoint and the saved tokenizer.
    pub fn from_checkpoint(
        output_dir: impl AsRef<Path>,
        config:     GenerationConfig,
        device:     B::Device,
    ) -> Result<Self> {
        let dir  = output_dir.as_ref();
        let ckpt = CheckpointManager::open(dir);

        let run_cfg   = ckpt.load_config()?;
        let model_cfg = ckpt.load_model_config()?;
        tracing::info!("Checkpoint fine-tuned from '{}' on '{}'", run_cfg.model_id, run_cfg.data_path);

        let model     = ckpt.load_model(model_cfg.init::<B>(&device), &device)?;
        let tokenizer = TokenizerStore::new(dir).load()?;

        tracing::info!("Translator ready from '{}'", dir.display());
        Ok(Self { generator: Generator::new(model, tokenizer, config, device)? })
    }
}

impl TranslateUseCase<InferBackend> {
    /// Reuse the in-memory model from a finished training run.
    pub fn from_trained(trained: TrainedModel, config: GenerationConfig) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        Ok(Self {
            generator: Generator::new(trained.model, trained.tokenizer, config, device)?,
        })
    }
}

impl<B: Backend> Translator for TranslateUseCase<B> {
    fn translate(&self, modern_text: &str) -> Result<String> {
        let prompt    = build_prompt(modern_text);
        let generated = self.generator.generate(&prompt)?;
        tracing::debug!("Raw generation: {:?}", generated);
        Ok(extract_translation(&generated))
    }
}
