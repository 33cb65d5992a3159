// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Keeps a copy of the pretrained tokenizer.json next to the
// checkpoints, so `translate` works offline with exactly the
// vocabulary the model was fine-tuned on.

use anyhow::{anyhow, Context, Result};
use std::{fs, path::{Path, PathBuf}};
use tokenizers::Tokenizer;

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Copy `source` into the store, then load it from there.
    pub fn install(&self, source: &Path) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let dest = self.path();
        if source != dest {
            fs::copy(source, &dest).with_context(|| {
                format!("Cannot copy tokenizer '{}' to '{}'", source.display(), dest.display())
            })?;
        }
        tracing::info!("Tokenizer saved to '{}'", dest.display());
        self.load()
    }

    /// Load a previously saved tokenizer from JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        load_tokenizer(&self.path())
    }
}

pub fn load_tokenizer(path: &Path) -> Result<Tokenizer> {
    Tokenizer::from_file(path)
        .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {e}", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::word_level_tokenizer;

    #[test]
    fn test_install_copies_and_loads() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("tokenizer.json");
        word_level_tokenizer(&["thou", "art"]).save(&src, false).unwrap();

        let out = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(out.path());
        let tok = store.install(&src).unwrap();

        assert!(store.path().exists());
        assert_eq!(tok.token_to_id("thou"), Some(2));
        assert_eq!(store.load().unwrap().token_to_id("art"), Some(3));
    }

    #[test]
    fn test_load_missing_is_error() {
        let out = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(out.path()).load().is_err());
    }
}
