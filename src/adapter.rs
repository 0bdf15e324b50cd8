//! Sub-Tokenizer Adapter (C1).
//!
//! Thin wrapper over `tokenizers::Tokenizer`. All JSON mutation required by
//! the rest of this crate goes through the owning [`crate::descriptor`]
//! module, not through this adapter - the adapter only ever sees a
//! finished, already-remapped document and exposes the handful of
//! operations the rest of the pipeline needs.

use std::path::Path;

use tokenizers::{Encoding, Tokenizer, TruncationDirection, TruncationParams, TruncationStrategy};

use crate::error::{ModularTokenizerError, ModularTokenizerResult};
use crate::special_token::SpecialTokenRecord;

#[derive(Debug)]
pub struct SubTokenizerAdapter {
    inner: Tokenizer,
}

impl SubTokenizerAdapter {
    pub fn from_json_str(json: &str) -> ModularTokenizerResult<Self> {
        let inner = Tokenizer::from_str(json).map_err(|e| ModularTokenizerError::Engine(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn from_file(path: impl AsRef<Path>) -> ModularTokenizerResult<Self> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path).map_err(|e| ModularTokenizerError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?;
        Ok(Self { inner })
    }

    pub fn encode(&self, text: &str) -> ModularTokenizerResult<Encoding> {
        self.inner
            .encode(text, false)
            .map_err(|e| ModularTokenizerError::Engine(e.to_string()))
    }

    /// Returns the number of tokens actually created (tokens already present
    /// as specials are skipped by the underlying engine).
    pub fn add_special_tokens(&mut self, tokens: &[SpecialTokenRecord]) -> usize {
        let added: Vec<tokenizers::AddedToken> = tokens.iter().map(Into::into).collect();
        self.inner.add_special_tokens(&added)
    }

    pub fn enable_truncation(&mut self, max_len: usize) -> ModularTokenizerResult<()> {
        self.inner
            .with_truncation(Some(TruncationParams {
                max_length: max_len,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| ModularTokenizerError::Engine(e.to_string()))?;
        Ok(())
    }

    pub fn token_to_id(&self, text: &str) -> Option<u32> {
        self.inner.token_to_id(text)
    }

    pub fn id_to_token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }

    pub fn get_vocab(&self, with_added_tokens: bool) -> std::collections::HashMap<String, u32> {
        self.inner.get_vocab(with_added_tokens)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ModularTokenizerResult<()> {
        let path = path.as_ref();
        self.inner
            .save(path, false)
            .map_err(|e| ModularTokenizerError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            })
    }

    /// Round-trips the engine's own serialization. Every mutation path in
    /// [`crate::tokenizer::ModularTokenizer`] calls this immediately after
    /// touching the JSON document, so the JSON and the adapter never drift.
    pub fn serialize(&self) -> ModularTokenizerResult<String> {
        self.inner
            .to_string(false)
            .map_err(|e| ModularTokenizerError::Engine(e.to_string()))
    }
}
