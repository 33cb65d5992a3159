// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the console loop and the corpus pipeline can be exercised
// without a model or a file on disk.

use anyhow::Result;
use crate::domain::parallel_record::ParallelRecord;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce the parallel corpus.
///
/// Implementations:
///   - CsvCorpusLoader → reads a `modern,shakespearean` CSV file
pub trait CorpusSource {
    /// Load every sentence pair, in file order.
    fn load_records(&self) -> Result<Vec<ParallelRecord>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Any component that turns a modern English sentence into
/// Shakespearean English.
///
/// Implementations:
///   - TranslateUseCase → prompts the fine-tuned GPT-2
pub trait Translator {
    /// Translate one sentence. Each call is independent; no
    /// history is carried between calls.
    fn translate(&self, modern_text: &str) -> Result<String>;
}
