// ============================================================
// Layer 5 — Greedy Generator
// ============================================================
// Continues a prompt with the fine-tuned model, one token at a
// time, with no sampling:
//
//   ids = encode(prompt)
//   loop until len == prompt_len + max_new_tokens or EOS:
//       logits = model(ids)[last position]
//       penalise every token already in `ids`
//       ids.push(argmax(logits))
//   decode(ids, skip_special_tokens = true)
//
// Repetition penalty (one adjustment per distinct seen token):
//   logit > 0  → logit / penalty
//   logit < 0  → logit * penalty
// so a penalty above 1.0 always makes a repeat less likely.

use anyhow::{anyhow, Result};
use burn::prelude::*;
use std::collections::HashSet;
use tokenizers::Tokenizer;

use crate::data::encoder::pad_token_id;
use crate::ml::model::Gpt2Model;

#[derive(Config, Debug)]
pub struct GenerationConfig {
    /// Tokens generated on top of the prompt
    #[config(default = 20)]
    pub max_new_tokens: usize,
    /// 1.0 disables the penalty
    #[config(default = 1.3)]
    pub repetition_penalty: f32,
}

pub struct Generator<B: Backend> {
    model:     Gpt2Model<B>,
    tokenizer: Tokenizer,
    config:    GenerationConfig,
    eos_id:    u32,
    device:    B::Device,
}

impl<B: Backend> Generator<B> {
    pub fn new(
        model:     Gpt2Model<B>,
        tokenizer: Tokenizer,
        config:    GenerationConfig,
        device:    B::Device,
    ) -> Result<Self> {
        let eos_id = pad_token_id(&tokenizer)?;
        Ok(Self { model, tokenizer, config, eos_id, device })
    }

    /// Full decoded text: prompt plus continuation.
    pub fn generate(&self, prompt: &str) -> Result<String> {
        let enc = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| anyhow!("Prompt tokenise: {e}"))?;
        let mut ids: Vec<u32> = enc.get_ids().to_vec();

        // Keep room for at least one new token inside the position table.
        let context = self.model.n_positions;
        if ids.len() >= context {
            let drop = ids.len() + 1 - context;
            tracing::warn!("Prompt exceeds {} positions; dropping {} leading tokens", context, drop);
            ids.drain(..drop);
        }
        let prompt_len = ids.len();
        let max_len    = (prompt_len + self.config.max_new_tokens).min(context);

        while ids.len() < max_len {
            let mut scores = self.next_token_logits(&ids)?;
            apply_repetition_penalty(&mut scores, &ids, self.config.repetition_penalty);

            let next = greedy_pick(&scores)
                .ok_or_else(|| anyhow!("Model produced an empty vocabulary distribution"))?;
            ids.push(next);

            if next == self.eos_id {
                break;
            }
        }

        tracing::debug!("Generated {} tokens after a {}-token prompt", ids.len() - prompt_len, prompt_len);

        self.tokenizer
            .decode(&ids, true)
            .map_err(|e| anyhow!("Decode: {e}"))
    }

    /// Logits for the position after the last token in `ids`.
    fn next_token_logits(&self, ids: &[u32]) -> Result<Vec<f32>> {
        let seq_len = ids.len();
        let input: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
        let input = Tensor::<B, 2, Int>::from_data(TensorData::new(input, [1, seq_len]), &self.device);

        let logits = self.model.forward(input, None); // [1, seq, vocab]
        let [_, _, vocab] = logits.dims();
        let last = logits
            .slice([0..1, seq_len - 1..seq_len, 0..vocab])
            .reshape([vocab]);

        last.into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read logits: {e:?}"))
    }
}

/// Scale down the score of every distinct token in `seen`.
pub fn apply_repetition_penalty(scores: &mut [f32], seen: &[u32], penalty: f32) {
    if penalty == 1.0 {
        return;
    }
    let distinct: HashSet<u32> = seen.iter().copied().collect();
    for id in distinct {
        if let Some(s) = scores.get_mut(id as usize) {
            *s = if *s < 0.0 { *s * penalty } else { *s / penalty };
        }
    }
}

/// Index of the highest score (first one on ties).
pub fn greedy_pick(scores: &[f32]) -> Option<u32> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
        .map(|(i, _)| i as u32)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::word_level_tokenizer;
    use crate::ml::model::Gpt2Config;

    type TestBackend = burn::backend::NdArray;

    #[test]
    fn test_penalty_only_touches_seen_tokens() {
        let mut scores = vec![2.0, -2.0, 3.0, -1.0];
        apply_repetition_penalty(&mut scores, &[0, 1, 1, 1], 2.0);
        assert_eq!(scores, vec![1.0, -4.0, 3.0, -1.0]);
    }

    #[test]
    fn test_penalty_of_one_is_identity() {
        let mut scores = vec![0.5, -0.5];
        apply_repetition_penalty(&mut scores, &[0, 1], 1.0);
        assert_eq!(scores, vec![0.5, -0.5]);
    }

    #[test]
    fn test_penalty_ignores_out_of_range_ids() {
        let mut scores = vec![1.0];
        apply_repetition_penalty(&mut scores, &[7], 1.3);
        assert_eq!(scores, vec![1.0]);
    }

    #[test]
    fn test_penalty_can_change_the_winner() {
        let mut scores = vec![1.2, 1.0];
        assert_eq!(greedy_pick(&scores), Some(0));
        apply_repetition_penalty(&mut scores, &[0], 1.3);
        assert_eq!(greedy_pick(&scores), Some(1));
    }

    #[test]
    fn test_greedy_pick_argmax_first_tie() {
        assert_eq!(greedy_pick(&[0.1, 0.9, 0.3]), Some(1));
        assert_eq!(greedy_pick(&[0.5, 0.5]), Some(0));
        assert_eq!(greedy_pick(&[]), None);
    }

    #[test]
    fn test_generation_is_bounded_and_deterministic() {
        let tokenizer = word_level_tokenizer(&["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"]);
        let vocab = tokenizer.get_vocab_size(true);
        let device = Default::default();
        let model: Gpt2Model<TestBackend> =
            Gpt2Config::new(vocab, 32, 8, 1, 2).with_dropout(0.0).init(&device);

        let config = GenerationConfig::new().with_max_new_tokens(5);
        let generator = Generator::new(model, tokenizer, config, device).unwrap();

        let first = generator.generate("a b c").unwrap();
        let second = generator.generate("a b c").unwrap();
        assert_eq!(first, second);
        assert!(first.split_whitespace().count() <= 3 + 5);
    }
}
