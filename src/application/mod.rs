// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor math and no console I/O.
// Each use case wires the data, ml and infra layers together
// for one goal.

// The fine-tuning workflow
pub mod train_use_case;

// One prompt → one cleaned translation
pub mod translate_use_case;
