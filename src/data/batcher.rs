// ============================================================
// Layer 4 — Causal LM Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<TokenRecord>
// into device tensors.
//
//   Input:  Vec of N TokenRecords, each of length S (pre-padded)
//   Output: CausalLmBatch with tensors of shape [N, S]
//
// All records are already padded to the same length, so batching
// is a flatten + reshape.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TokenRecord;

/// A batch of token records ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct CausalLmBatch<B: Backend> {
    /// Token ids, shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding, shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Next-token targets before shifting, shape: [batch_size, seq_len]
    pub labels: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct CausalLmBatcher;

impl CausalLmBatcher {
    pub fn new() -> Self {
        Self
    }
}

/// Flatten one field of every record into a [batch, seq] tensor.
fn stack<B: Backend>(
    items:  &[TokenRecord],
    field:  impl Fn(&TokenRecord) -> &[u32],
    device: &B::Device,
) -> Tensor<B, 2, Int> {
    let batch_size = items.len();
    let seq_len    = items.first().map(|r| field(r).len()).unwrap_or(0);

    let flat: Vec<i32> = items
        .iter()
        .flat_map(|r| field(r).iter().map(|&x| x as i32))
        .collect();

    Tensor::<B, 2, Int>::from_data(TensorData::new(flat, [batch_size, seq_len]), device)
}

impl<B: Backend> Batcher<B, TokenRecord, CausalLmBatch<B>> for CausalLmBatcher {
    fn batch(&self, items: Vec<TokenRecord>, device: &B::Device) -> CausalLmBatch<B> {
        CausalLmBatch {
            input_ids:      stack::<B>(&items, |r| &r.input_ids, device),
            attention_mask: stack::<B>(&items, |r| &r.attention_mask, device),
            labels:         stack::<B>(&items, |r| &r.labels, device),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn record(ids: &[u32], real: usize) -> TokenRecord {
        let mask = (0..ids.len()).map(|i| u32::from(i < real)).collect();
        TokenRecord { input_ids: ids.to_vec(), attention_mask: mask, labels: ids.to_vec() }
    }

    #[test]
    fn test_batch_shapes_and_order() {
        let device = Default::default();
        let items = vec![record(&[5, 6, 0, 0], 2), record(&[7, 8, 9, 0], 3)];
        let batch: CausalLmBatch<TestBackend> = CausalLmBatcher::new().batch(items, &device);

        assert_eq!(batch.input_ids.dims(), [2, 4]);
        assert_eq!(batch.attention_mask.dims(), [2, 4]);
        assert_eq!(batch.labels.dims(), [2, 4]);

        let ids: Vec<i64> = batch.input_ids.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(ids, vec![5, 6, 0, 0, 7, 8, 9, 0]);

        let mask: Vec<i64> = batch.attention_mask.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(mask, vec![1, 1, 0, 0, 1, 1, 1, 0]);
    }
}
