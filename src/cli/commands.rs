// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands:
//
//   train      — fine-tune and write checkpoints, then stop
//   translate  — load the latest checkpoint; REPL or --sentence
//   run        — train, then drop straight into the REPL
//
// Defaults reproduce the fixed fine-tuning recipe: batch 4,
// 5 epochs, lr 5e-5, weight decay 0.01, keep 2 checkpoints.

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::infra::hub::{DEFAULT_MODEL_ID, DEFAULT_REVISION};
use crate::ml::generator::GenerationConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the pretrained model on the parallel corpus
    Train(TrainArgs),

    /// Translate with the latest saved checkpoint
    Translate(TranslateArgs),

    /// Fine-tune, then translate interactively with the fresh model
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// CSV with `modern` and `shakespearean` columns
    #[arg(long = "data", default_value = "data/modern-to-shakespeare.csv")]
    pub data_path: String,

    /// Hugging Face hub id of the pretrained GPT-2
    #[arg(long = "model", default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Hub revision (branch, tag or commit)
    #[arg(long, default_value = DEFAULT_REVISION)]
    pub revision: String,

    /// Where checkpoints, configs, tokenizer and metrics go
    #[arg(long, default_value = "shakespeare-gpt2")]
    pub output_dir: String,

    /// Tokens per training sequence (truncate or pad)
    #[arg(
        long,
        default_value_t = 128,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..),
    )]
    pub max_seq_len: usize,

    #[arg(
        long,
        default_value_t = 4,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..),
    )]
    pub batch_size: usize,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long = "lr", default_value_t = 5e-5)]
    pub learning_rate: f64,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Checkpoints kept on disk; older ones are deleted
    #[arg(long, default_value_t = 2)]
    pub save_total_limit: usize,

    /// Share of pairs held out for evaluation
    #[arg(long, default_value_t = 0.1)]
    pub eval_fraction: f64,

    /// Seed for the train/eval split and batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:        a.data_path,
            model_id:         a.model_id,
            revision:         a.revision,
            output_dir:       a.output_dir,
            max_seq_len:      a.max_seq_len,
            batch_size:       a.batch_size,
            epochs:           a.epochs,
            learning_rate:    a.learning_rate,
            weight_decay:     a.weight_decay,
            save_total_limit: a.save_total_limit,
            eval_fraction:    a.eval_fraction,
            seed:             a.seed,
        }
    }
}

/// Decoding knobs shared by `translate` and `run`.
#[derive(Args, Debug, Clone)]
pub struct GenerationArgs {
    /// Tokens generated after the prompt
    #[arg(long, default_value_t = 20)]
    pub max_new_tokens: usize,

    /// Penalty on already-seen tokens (1.0 = off)
    #[arg(long, default_value_t = 1.3)]
    pub repetition_penalty: f32,
}

impl From<GenerationArgs> for GenerationConfig {
    fn from(a: GenerationArgs) -> Self {
        GenerationConfig::new()
            .with_max_new_tokens(a.max_new_tokens)
            .with_repetition_penalty(a.repetition_penalty)
    }
}

#[derive(Args, Debug, Clone)]
pub struct TranslateArgs {
    /// Directory written by `train`
    #[arg(long, default_value = "shakespeare-gpt2")]
    pub output_dir: String,

    /// Translate one sentence and exit instead of starting the prompt loop
    #[arg(long)]
    pub sentence: Option<String>,

    #[command(flatten)]
    pub generation: GenerationArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub train: TrainArgs,

    #[command(flatten)]
    pub generation: GenerationArgs,
}
