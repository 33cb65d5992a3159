use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised and padded training example.
/// `labels` is a copy of `input_ids`; the shift happens in the loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub labels:         Vec<u32>,
}

pub struct CausalLmDataset {
    records: Vec<TokenRecord>,
}

impl CausalLmDataset {
    pub fn new(records: Vec<TokenRecord>) -> Self { Self { records } }
}

impl Dataset<TokenRecord> for CausalLmDataset {
    fn get(&self, index: usize) -> Option<TokenRecord> {
        self.records.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
