// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here.
//
//   model.rs     — GPT-2 decoder (embeddings, causal attention,
//                  MLP, tied LM head) and the shifted LM loss
//
//   import.rs    — hub safetensors → Gpt2Model
//
//   trainer.rs   — AdamW fine-tuning loop with per-epoch eval,
//                  metrics and checkpoint rotation
//
//   generator.rs — greedy decoding with a repetition penalty

/// GPT-2 causal language model
pub mod model;

/// Pretrained weight import
pub mod import;

/// Fine-tuning loop
pub mod trainer;

/// Autoregressive text generation
pub mod generator;

/// Backend used while fine-tuning (gradients tracked).
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend used for eval and translation.
pub type InferBackend = burn::backend::Wgpu;
