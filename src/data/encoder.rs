// ============================================================
// Layer 4 — Causal LM Encoder
// ============================================================
// Converts a formatted training string into a fixed-length
// TokenRecord for causal language modelling.
//
//   "Modern: Hi\nShakespearean: Hail [END]"
//        │ tokenizer.encode
//        ▼
//   [ids...]               (n tokens)
//        │ truncate to max_len, pad with <|endoftext|>
//        ▼
//   input_ids      = [t0 t1 ... tn-1 PAD PAD ... ]  (exactly max_len)
//   attention_mask = [ 1  1 ...  1    0   0  ... ]
//   labels         = input_ids (copy)
//
// Labels cover the whole string, prompt prefix included. Padded
// label positions are ignored by the loss (see ml::model).

use anyhow::{anyhow, Result};
use tokenizers::Tokenizer;

use crate::data::dataset::TokenRecord;

/// GPT-2's end-of-text token, used both as EOS and as padding.
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// Id of the token used for padding (and end of generation).
pub fn pad_token_id(tokenizer: &Tokenizer) -> Result<u32> {
    tokenizer
        .token_to_id(END_OF_TEXT)
        .ok_or_else(|| anyhow!("Tokenizer has no '{END_OF_TEXT}' token to pad with"))
}

pub struct CausalLmEncoder<'a> {
    tokenizer: &'a Tokenizer,
    max_len:   usize,
    pad_id:    u32,
}

impl<'a> CausalLmEncoder<'a> {
    pub fn new(tokenizer: &'a Tokenizer, max_len: usize) -> Result<Self> {
        let pad_id = pad_token_id(tokenizer)?;
        Ok(Self { tokenizer, max_len, pad_id })
    }

    /// Tokenise, truncate and pad one string.
    pub fn encode(&self, text: &str) -> Result<TokenRecord> {
        let enc = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let mut input_ids: Vec<u32> = enc.get_ids().to_vec();
        input_ids.truncate(self.max_len);

        let real_len           = input_ids.len();
        let mut attention_mask = vec![1u32; real_len];

        input_ids.resize(self.max_len, self.pad_id);
        attention_mask.resize(self.max_len, 0);

        let labels = input_ids.clone();

        Ok(TokenRecord { input_ids, attention_mask, labels })
    }

    pub fn encode_all(&self, texts: &[String]) -> Result<Vec<TokenRecord>> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Small in-memory WordLevel tokenizer for tests. Id 0 is
/// `<|endoftext|>`, id 1 is `[UNK]`, then `words` in order.
#[cfg(test)]
pub(crate) fn word_level_tokenizer(words: &[&str]) -> Tokenizer {
    use std::str::FromStr;

    let mut vocab = serde_json::json!({ END_OF_TEXT: 0, "[UNK]": 1 });
    for (i, w) in words.iter().enumerate() {
        vocab[*w] = serde_json::json!(i + 2);
    }

    let json = serde_json::json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": 0, "content": END_OF_TEXT, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
            {"id": 1, "content": "[UNK]",     "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": { "type": "WordLevel", "vocab": vocab, "unk_token": "[UNK]" }
    });

    Tokenizer::from_str(&json.to_string()).unwrap()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parallel_record::ParallelRecord;

    fn tokenizer() -> Tokenizer {
        word_level_tokenizer(&["Modern", "Shakespearean", ":", "[", "]", "END", "Hello", "Good", "morrow"])
    }

    #[test]
    fn test_short_sequence_padded_to_max_len() {
        let tok = tokenizer();
        let enc = CausalLmEncoder::new(&tok, 128).unwrap();
        let text = ParallelRecord::new("Hello", "Good morrow").formatted();
        let rec = enc.encode(&text).unwrap();

        assert_eq!(rec.input_ids.len(), 128);
        assert_eq!(rec.attention_mask.len(), 128);

        let real = rec.attention_mask.iter().filter(|&&m| m == 1).count();
        assert!(real > 0 && real < 128);
        assert!(rec.input_ids[real..].iter().all(|&id| id == enc.pad_id));
        assert!(rec.attention_mask[real..].iter().all(|&m| m == 0));
    }

    #[test]
    fn test_long_sequence_truncated() {
        let tok = tokenizer();
        let enc = CausalLmEncoder::new(&tok, 8).unwrap();
        let text = "Hello ".repeat(50);
        let rec = enc.encode(&text).unwrap();

        assert_eq!(rec.input_ids.len(), 8);
        assert!(rec.attention_mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_labels_copy_inputs() {
        let tok = tokenizer();
        let enc = CausalLmEncoder::new(&tok, 16).unwrap();
        let rec = enc.encode("Modern: Hello").unwrap();
        assert_eq!(rec.labels, rec.input_ids);
    }

    #[test]
    fn test_never_exceeds_max_len() {
        let tok = tokenizer();
        let enc = CausalLmEncoder::new(&tok, 128).unwrap();
        for n in [0usize, 1, 64, 127, 128, 129, 400] {
            let rec = enc.encode(&"Good ".repeat(n)).unwrap();
            assert_eq!(rec.input_ids.len(), 128);
        }
    }

    #[test]
    fn test_missing_pad_token_is_error() {
        use std::str::FromStr;
        let json = r#"{"version":"1.0","truncation":null,"padding":null,"added_tokens":[],
            "normalizer":null,"pre_tokenizer":{"type":"Whitespace"},"post_processor":null,"decoder":null,
            "model":{"type":"WordLevel","vocab":{"[UNK]":0},"unk_token":"[UNK]"}}"#;
        let tok = Tokenizer::from_str(json).unwrap();
        assert!(CausalLmEncoder::new(&tok, 128).is_err());
    }
}
