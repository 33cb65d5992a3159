// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the fine-tuning pipeline in order:
//
//   Step 1: Load the parallel CSV       (Layer 4 - data)
//   Step 2: Format each pair            (Layer 3 - domain)
//   Step 3: Split train/eval            (Layer 4 - data)
//   Step 4: Fetch pretrained files      (Layer 6 - infra)
//   Step 5: Persist configs + tokenizer (Layer 6 - infra)
//   Step 6: Tokenize into datasets      (Layer 4 - data)
//   Step 7: Import pretrained weights   (Layer 5 - ml)
//   Step 8: Run training loop           (Layer 5 - ml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::{
    dataset::CausalLmDataset,
    encoder::CausalLmEncoder,
    loader::CsvCorpusLoader,
    splitter::split_train_eval,
};
use crate::domain::traits::CorpusSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    hub::{HubGpt2Config, PretrainedSource, DEFAULT_MODEL_ID, DEFAULT_REVISION},
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    import::load_gpt2_safetensors,
    model::Gpt2Model,
    trainer::run_training,
    InferBackend, TrainBackend,
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a fine-tuning run. Saved next to the
// checkpoints as train_config.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_path:        String,
    pub model_id:         String,
    pub revision:         String,
    pub output_dir:       String,
    pub max_seq_len:      usize,
    pub batch_size:       usize,
    pub epochs:           usize,
    pub learning_rate:    f64,
    pub weight_decay:     f64,
    pub save_total_limit: usize,
    pub eval_fraction:    f64,
    pub seed:             u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:        "data/modern-to-shakespeare.csv".to_string(),
            model_id:         DEFAULT_MODEL_ID.to_string(),
            revision:         DEFAULT_REVISION.to_string(),
            output_dir:       "shakespeare-gpt2".to_string(),
            max_seq_len:      128,
            batch_size:       4,
            epochs:           5,
            learning_rate:    5e-5,
            weight_decay:     0.01,
            save_total_limit: 2,
            eval_fraction:    0.1,
            seed:             42,
        }
    }
}

impl TrainConfig {
    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        // The shifted loss needs at least one (input, next token) pair
        if self.max_seq_len < 2 {
            bail!("max_seq_len must be at least 2, got {}", self.max_seq_len);
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        Ok(())
    }
}

/// What a finished run hands to the translator.
pub struct TrainedModel {
    pub model:     Gpt2Model<InferBackend>,
    pub tokenizer: Tokenizer,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full fine-tuning pipeline end to end
    pub fn execute(&self) -> Result<TrainedModel> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1–2: Load and format the corpus ──────────────────────────────
        let loader  = CsvCorpusLoader::new(&cfg.data_path);
        let records = loader.load_records()?;
        let texts: Vec<String> = records.iter().map(|r| r.formatted()).collect();
        tracing::debug!("Formatted {} training strings from '{}'", texts.len(), loader.path().display());

        // ── Step 3: Train / eval split ────────────────────────────────────────
        let split = split_train_eval(texts, cfg.eval_fraction, cfg.seed);
        tracing::info!("Split: {} train, {} eval", split.train.len(), split.eval.len());

        // ── Step 4: Pretrained model files ────────────────────────────────────
        let files     = PretrainedSource::new(&cfg.model_id, &cfg.revision).fetch()?;
        let model_cfg = HubGpt2Config::from_file(&files.config)?.to_model_config();
        tracing::info!(
            "Model '{}': {} layers, {} heads, n_embd={}, vocab={}",
            cfg.model_id, model_cfg.n_layer, model_cfg.n_head,
            model_cfg.n_embd, model_cfg.vocab_size,
        );

        // ── Step 5: Persist what inference needs to rebuild the model ─────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir, cfg.save_total_limit)?;
        ckpt_manager.start_run()?;
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_model_config(&model_cfg)?;
        let tokenizer = TokenizerStore::new(&cfg.output_dir).install(&files.tokenizer)?;

        // ── Step 6: Tokenize ──────────────────────────────────────────────────
        let encoder       = CausalLmEncoder::new(&tokenizer, cfg.max_seq_len)?;
        let train_dataset = CausalLmDataset::new(encoder.encode_all(&split.train)?);
        let eval_dataset  = CausalLmDataset::new(encoder.encode_all(&split.eval)?);

        // ── Step 7: Pretrained weights on the training backend ────────────────
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        let model = load_gpt2_safetensors::<TrainBackend>(&model_cfg, &files.weights, &device)?;

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        let model = run_training::<TrainBackend>(
            cfg,
            model,
            train_dataset,
            eval_dataset,
            &ckpt_manager,
            &metrics,
            &device,
        )?;
        tracing::info!("Metrics written to '{}'", metrics.csv_path().display());

        Ok(TrainedModel { model, tokenizer })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fine_tuning_recipe() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.max_seq_len, 128);
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.epochs, 5);
        assert_eq!(cfg.save_total_limit, 2);
        assert!((cfg.learning_rate - 5e-5).abs() < 1e-12);
        assert!((cfg.weight_decay - 0.01).abs() < 1e-12);
        assert!((cfg.eval_fraction - 0.1).abs() < 1e-12);
        assert_eq!(cfg.output_dir, "shakespeare-gpt2");
    }

    #[test]
    fn test_config_survives_checkpoint_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path(), 2).unwrap();
        let cfg = TrainConfig { epochs: 3, seed: 7, ..TrainConfig::default() };
        mgr.save_config(&cfg).unwrap();

        let loaded = mgr.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.seed, 7);
        assert_eq!(loaded.model_id, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_validate_rejects_sequences_too_short_to_shift() {
        for len in [0, 1] {
            let cfg = TrainConfig { max_seq_len: len, ..TrainConfig::default() };
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains("max_seq_len"));
        }
        let cfg = TrainConfig { max_seq_len: 2, ..TrainConfig::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let cfg = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_execute_fails_fast_on_short_sequences() {
        // Validation runs before the corpus path is touched
        let cfg = TrainConfig {
            max_seq_len: 1,
            data_path:   "does/not/exist.csv".to_string(),
            ..TrainConfig::default()
        };
        let err = TrainUseCase::new(cfg).execute().err().unwrap();
        assert!(err.to_string().contains("max_seq_len"));
    }
}
