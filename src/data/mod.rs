// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV to device-ready tensor batches:
//
//   modern-to-shakespeare.csv
//       │
//       ▼
//   CsvCorpusLoader   → reads (modern, shakespearean) pairs
//       │
//       ▼
//   ParallelRecord    → "Modern: …\nShakespearean: … [END]"
//       │
//       ▼
//   split_train_eval  → seeded shuffle, 10% held out
//       │
//       ▼
//   CausalLmEncoder   → fixed-length ids + mask, labels = ids
//       │
//       ▼
//   CausalLmDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   CausalLmBatcher   → stacks records into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

/// Reads the parallel corpus from CSV
pub mod loader;

/// Shuffles and splits data into train/eval sets
pub mod splitter;

/// Tokenises formatted strings into fixed-length records
pub mod encoder;

/// Implements Burn's Dataset trait for token records
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
