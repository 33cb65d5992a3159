// ============================================================
// Layer 3 — ParallelRecord Domain Type
// ============================================================
// One row of the parallel corpus: a modern English sentence and
// its Shakespearean rendering.
//
// The fine-tuning stage never sees the pair directly. It sees a
// single annotated string in which the model learns to continue
// "Shakespearean:" after reading "Modern:":
//
//   Modern: I am very tired.
//   Shakespearean: I am sore weary. [END]
//
// The trailing [END] marker teaches the model where a translation
// stops; the translate stage strips it from generated output.

/// Marker appended to every training string, removed after generation.
pub const END_MARKER: &str = "[END]";

/// A (modern, Shakespearean) sentence pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelRecord {
    pub modern:        String,
    pub shakespearean: String,
}

impl ParallelRecord {
    pub fn new(modern: impl Into<String>, shakespearean: impl Into<String>) -> Self {
        Self {
            modern:        modern.into(),
            shakespearean: shakespearean.into(),
        }
    }

    /// The annotated causal-LM training string for this pair.
    pub fn formatted(&self) -> String {
        format!(
            "Modern: {}\nShakespearean: {} {}",
            self.modern, self.shakespearean, END_MARKER
        )
    }
}
