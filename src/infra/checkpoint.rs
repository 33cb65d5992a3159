// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder,
// keeping only the newest few epochs on disk.
//
// File layout of the output directory:
//
//   shakespeare-gpt2/
//     checkpoint-4.mpk       ← weights after epoch 4
//     checkpoint-5.mpk       ← weights after epoch 5 (latest)
//     latest_epoch.json      ← number of the latest epoch
//     train_config.json      ← run hyperparameters
//     model_config.json      ← GPT-2 architecture
//     tokenizer.json         ← tokenizer used for training
//     metrics.csv            ← one row per epoch
//
// A training run starts by clearing checkpoints left by an
// earlier run. After every save, checkpoints beyond
// `save_total_limit` are removed oldest-first, so the directory
// never holds more than that many snapshots. The epoch just
// saved is never evicted.

use anyhow::{anyhow, Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::{Gpt2Config, Gpt2Model};

pub const CHECKPOINT_PREFIX: &str = "checkpoint-";
// CompactRecorder writes named MessagePack files
const CHECKPOINT_SUFFIX: &str = ".mpk";

/// Manages saving, loading and rotation of model checkpoints.
pub struct CheckpointManager {
    dir:             PathBuf,
    save_total_limit: usize,
}

impl CheckpointManager {
    /// Create a manager over `dir`, creating the directory if needed.
    /// A limit of 0 is treated as 1: the latest checkpoint always survives.
    pub fn new(dir: impl Into<PathBuf>, save_total_limit: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir, save_total_limit: save_total_limit.max(1) })
    }

    /// Remove checkpoints and the latest pointer from a previous
    /// run, so epoch numbers on disk all belong to this run.
    /// Returns the epochs that were removed.
    pub fn start_run(&self) -> Result<Vec<usize>> {
        let stale = self.list_epochs()?;
        for epoch in &stale {
            self.remove_checkpoint(*epoch)?;
        }
        let latest_path = self.dir.join("latest_epoch.json");
        if latest_path.exists() {
            fs::remove_file(&latest_path)
                .with_context(|| format!("Cannot delete '{}'", latest_path.display()))?;
        }
        if !stale.is_empty() {
            tracing::warn!(
                "Removed {} checkpoint(s) from a previous run in '{}'",
                stale.len(),
                self.dir.display()
            );
        }
        Ok(stale)
    }

    /// Open an existing output directory for inference.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), save_total_limit: usize::MAX }
    }

    /// Save weights for `epoch`, update the latest pointer, then
    /// rotate. Returns the epochs that were evicted.
    pub fn save_model<B: Backend>(&self, model: &Gpt2Model<B>, epoch: usize) -> Result<Vec<usize>> {
        // Recorder appends the extension itself
        let path = self.dir.join(format!("{CHECKPOINT_PREFIX}{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join("latest_epoch.json");
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| "Failed to write latest_epoch.json")?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);

        self.enforce_retention(epoch)
    }

    /// Load weights from the latest saved checkpoint into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  Gpt2Model<B>,
        device: &B::Device,
    ) -> Result<Gpt2Model<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("{CHECKPOINT_PREFIX}{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display())
            })?;

        Ok(model.load_record(record))
    }

    /// Epoch numbers of the checkpoints on disk, oldest first.
    pub fn list_epochs(&self) -> Result<Vec<usize>> {
        let mut epochs: Vec<usize> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot read directory '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| parse_checkpoint_epoch(&entry.file_name().to_string_lossy()))
            .collect();
        epochs.sort_unstable();
        Ok(epochs)
    }

    /// Delete the oldest checkpoints beyond the limit, never `keep`.
    pub fn enforce_retention(&self, keep: usize) -> Result<Vec<usize>> {
        let others: Vec<usize> = self
            .list_epochs()?
            .into_iter()
            .filter(|&e| e != keep)
            .collect();
        // One slot is reserved for `keep`
        let excess = others.len().saturating_sub(self.save_total_limit - 1);

        let evicted: Vec<usize> = others.into_iter().take(excess).collect();
        for epoch in &evicted {
            self.remove_checkpoint(*epoch)?;
            tracing::info!("Deleted old checkpoint for epoch {}", epoch);
        }
        Ok(evicted)
    }

    fn remove_checkpoint(&self, epoch: usize) -> Result<()> {
        let path = self
            .dir
            .join(format!("{CHECKPOINT_PREFIX}{epoch}{CHECKPOINT_SUFFIX}"));
        fs::remove_file(&path)
            .with_context(|| format!("Cannot delete old checkpoint '{}'", path.display()))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'translate'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Persist the architecture so the model can be rebuilt offline.
    pub fn save_model_config(&self, cfg: &Gpt2Config) -> Result<()> {
        let path = self.dir.join("model_config.json");
        cfg.save(&path)
            .with_context(|| format!("Cannot write model config to '{}'", path.display()))
    }

    pub fn load_model_config(&self) -> Result<Gpt2Config> {
        let path = self.dir.join("model_config.json");
        Gpt2Config::load(&path)
            .map_err(|e| anyhow!("Cannot read model config '{}': {e}", path.display()))
    }

    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'latest_epoch.json'. \
                 Have you run 'train' first?"
            })?;
        Ok(serde_json::from_str::<usize>(&s)?)
    }
}

/// `checkpoint-12.mpk` → Some(12)
fn parse_checkpoint_epoch(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(CHECKPOINT_PREFIX)?
        .strip_suffix(CHECKPOINT_SUFFIX)?
        .parse()
        .ok()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    type TestBackend = burn::backend::NdArray;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_parse_checkpoint_epoch() {
        assert_eq!(parse_checkpoint_epoch("checkpoint-3.mpk"), Some(3));
        assert_eq!(parse_checkpoint_epoch("checkpoint-x.mpk"), None);
        assert_eq!(parse_checkpoint_epoch("checkpoint-3.mpk.gz"), None);
        assert_eq!(parse_checkpoint_epoch("metrics.csv"), None);
    }

    #[test]
    fn test_retention_evicts_oldest_first() {
        let tmp = tempfile::tempdir().unwrap();
        for e in [1, 2, 10, 3] {
            touch(tmp.path(), &format!("checkpoint-{e}.mpk"));
        }
        touch(tmp.path(), "metrics.csv");

        let mgr = CheckpointManager::new(tmp.path(), 2).unwrap();
        let evicted = mgr.enforce_retention(10).unwrap();

        assert_eq!(evicted, vec![1, 2]);
        assert_eq!(mgr.list_epochs().unwrap(), vec![3, 10]);
        assert!(tmp.path().join("metrics.csv").exists());
    }

    #[test]
    fn test_zero_limit_still_keeps_latest() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "checkpoint-1.mpk");
        touch(tmp.path(), "checkpoint-2.mpk");

        let mgr = CheckpointManager::new(tmp.path(), 0).unwrap();
        mgr.enforce_retention(2).unwrap();
        assert_eq!(mgr.list_epochs().unwrap(), vec![2]);
    }

    #[test]
    fn test_never_more_than_two_after_five_epochs() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model: Gpt2Model<TestBackend> = Gpt2Config::new(8, 4, 4, 1, 1).init(&device);

        let mgr = CheckpointManager::new(tmp.path(), 2).unwrap();
        for epoch in 1..=5 {
            mgr.save_model(&model, epoch).unwrap();
            assert!(mgr.list_epochs().unwrap().len() <= 2);
        }
        assert_eq!(mgr.list_epochs().unwrap(), vec![4, 5]);
        assert!(tmp.path().join("checkpoint-5.mpk").exists());
        assert!(!tmp.path().join("checkpoint-3.mpk").exists());

        let fresh: Gpt2Model<TestBackend> = Gpt2Config::new(8, 4, 4, 1, 1).init(&device);
        let restored = mgr.load_model(fresh, &device).unwrap();
        assert_eq!(restored.wte.weight.val().dims(), [8, 4]);
    }

    #[test]
    fn test_just_saved_epoch_is_never_evicted() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "checkpoint-4.mpk");
        touch(tmp.path(), "checkpoint-5.mpk");
        touch(tmp.path(), "checkpoint-1.mpk");

        let mgr = CheckpointManager::new(tmp.path(), 2).unwrap();
        let evicted = mgr.enforce_retention(1).unwrap();

        assert_eq!(evicted, vec![4]);
        assert_eq!(mgr.list_epochs().unwrap(), vec![1, 5]);
    }

    #[test]
    fn test_rerun_into_existing_dir_keeps_latest_loadable() {
        let tmp = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model: Gpt2Model<TestBackend> = Gpt2Config::new(8, 4, 4, 1, 1).init(&device);

        // Earlier run with five epochs
        let first = CheckpointManager::new(tmp.path(), 2).unwrap();
        for epoch in 1..=5 {
            first.save_model(&model, epoch).unwrap();
        }

        // Second, shorter run into the same directory
        let second = CheckpointManager::new(tmp.path(), 2).unwrap();
        assert_eq!(second.start_run().unwrap(), vec![4, 5]);
        assert!(second.list_epochs().unwrap().is_empty());
        assert!(second.load_model(model.clone(), &device).is_err());

        for epoch in 1..=3 {
            second.save_model(&model, epoch).unwrap();
        }
        assert_eq!(second.list_epochs().unwrap(), vec![2, 3]);
        assert!(second.load_model(model, &device).is_ok());
    }

    #[test]
    fn test_model_config_persists() {
        let tmp = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(tmp.path(), 2).unwrap();
        let cfg = Gpt2Config::new(50257, 1024, 768, 12, 12);
        mgr.save_model_config(&cfg).unwrap();

        let loaded = mgr.load_model_config().unwrap();
        assert_eq!(loaded.n_embd, 768);
        assert_eq!(loaded.n_layer, 12);
    }
}
