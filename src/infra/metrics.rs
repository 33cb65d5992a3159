// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch to <output_dir>/metrics.csv:
//
//   epoch,train_loss,eval_loss,perplexity
//   1,3.412200,3.198100,24.487000
//   2,2.904300,3.010700,20.301000
//
// Perplexity is exp(eval_loss). When the eval split is empty
// eval_loss and perplexity are written as NaN.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

pub const METRICS_HEADER: &str = "epoch,train_loss,eval_loss,perplexity";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean next-token cross-entropy over the training batches
    pub train_loss: f64,

    /// Mean next-token cross-entropy over the eval split
    pub eval_loss: f64,

    /// exp(eval_loss)
    pub perplexity: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, eval_loss: f64) -> Self {
        Self { epoch, train_loss, eval_loss, perplexity: eval_loss.exp() }
    }

    /// True if eval loss beat `best_eval_loss`. NaN never improves.
    pub fn is_improvement(&self, best_eval_loss: f64) -> bool {
        self.eval_loss < best_eval_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// repeated runs into the same directory append.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{METRICS_HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.eval_loss,
            m.perplexity,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, eval_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.eval_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
