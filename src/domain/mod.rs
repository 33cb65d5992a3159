// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing what the translator
// works with: sentence pairs, the instruction prompt, and the
// translation abstraction the console loop talks to.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, functions and traits
//
// Everything here is unit-testable without a GPU or a model.

// A (modern, Shakespearean) sentence pair and its training string
pub mod parallel_record;

// Instruction prompt construction and response extraction
pub mod prompt;

// Core abstractions (traits) that other layers implement
pub mod traits;
