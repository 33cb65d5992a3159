// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the network on
// behalf of the other layers:
//
//   hub.rs             — pretrained files from the Hugging Face
//                        hub (config, tokenizer, safetensors)
//
//   checkpoint.rs      — per-epoch weights via CompactRecorder,
//                        retention of the newest N, and the
//                        JSON configs needed to rebuild the model
//
//   tokenizer_store.rs — copy of tokenizer.json kept beside the
//                        checkpoints
//
//   metrics.rs         — epoch rows appended to metrics.csv

/// Hugging Face hub downloads and config parsing
pub mod hub;

/// Model checkpoint saving, loading and rotation
pub mod checkpoint;

/// Tokenizer persistence
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
