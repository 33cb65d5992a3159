// ============================================================
// Layer 6 — Pretrained Model Source (Hugging Face hub)
// ============================================================
// Fetches the three files a GPT-2 fine-tune needs:
//
//   config.json        → Gpt2Config
//   tokenizer.json     → tokenizers::Tokenizer
//   model.safetensors  → initial weights (ml::import)
//
// Downloads go through hf-hub's local cache, so only the first
// run needs the network.

use anyhow::{Context, Result};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::Gpt2Config;

pub const DEFAULT_MODEL_ID: &str = "MBL2/gpt2-old-english";
pub const DEFAULT_REVISION: &str = "main";

#[derive(Debug, Clone)]
pub struct PretrainedSource {
    pub model_id: String,
    pub revision: String,
}

/// Local paths of the downloaded files.
#[derive(Debug, Clone)]
pub struct PretrainedFiles {
    pub config:    PathBuf,
    pub tokenizer: PathBuf,
    pub weights:   PathBuf,
}

impl PretrainedSource {
    pub fn new(model_id: impl Into<String>, revision: impl Into<String>) -> Self {
        Self { model_id: model_id.into(), revision: revision.into() }
    }

    pub fn fetch(&self) -> Result<PretrainedFiles> {
        tracing::info!("Fetching '{}' (revision {}) from the hub", self.model_id, self.revision);

        let api  = Api::new().context("Cannot initialise the Hugging Face hub client")?;
        let repo = api.repo(Repo::with_revision(
            self.model_id.clone(),
            RepoType::Model,
            self.revision.clone(),
        ));

        let get = |file: &str| {
            repo.get(file).with_context(|| {
                format!("Cannot download '{file}' from '{}@{}'", self.model_id, self.revision)
            })
        };

        let files = PretrainedFiles {
            config:    get("config.json")?,
            tokenizer: get("tokenizer.json")?,
            weights:   get("model.safetensors")?,
        };
        tracing::debug!("Hub files cached at '{}'", files.weights.display());
        Ok(files)
    }
}

/// The subset of a hub GPT-2 `config.json` the model needs.
#[derive(Debug, Clone, Deserialize)]
pub struct HubGpt2Config {
    pub vocab_size: usize,
    #[serde(default = "default_n_positions")]
    pub n_positions: usize,
    pub n_embd:  usize,
    pub n_layer: usize,
    pub n_head:  usize,
    #[serde(default = "default_layer_norm_epsilon")]
    pub layer_norm_epsilon: f64,
    #[serde(default = "default_dropout")]
    pub resid_pdrop: f64,
}

fn default_n_positions() -> usize { 1024 }
fn default_layer_norm_epsilon() -> f64 { 1e-5 }
fn default_dropout() -> f64 { 0.1 }

impl HubGpt2Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read model config '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("'{}' is not a GPT-2 config", path.display()))
    }

    pub fn to_model_config(&self) -> Gpt2Config {
        Gpt2Config::new(
            self.vocab_size,
            self.n_positions,
            self.n_embd,
            self.n_layer,
            self.n_head,
        )
        .with_layer_norm_epsilon(self.layer_norm_epsilon)
        .with_dropout(self.resid_pdrop)
    }
}
