//! Reads and writes the two fields of a `tokenizers` JSON document that this
//! crate's invariants care about: `added_tokens` and `model.vocab`. Kept
//! separate from [`crate::adapter`] because the remapper (C2) and the
//! consistency checker (C4) operate on the raw document, not on the engine
//! handle - see the "two-representation bookkeeping" design note.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ModularTokenizerError, ModularTokenizerResult};
use crate::special_token::SpecialTokenRecord;

pub fn get_added_tokens(doc: &Value) -> ModularTokenizerResult<Vec<SpecialTokenRecord>> {
    match doc.get("added_tokens") {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ModularTokenizerError::ConfigError(format!("malformed added_tokens: {e}"))),
        None => Ok(Vec::new()),
    }
}

pub fn set_added_tokens(doc: &mut Value, tokens: &[SpecialTokenRecord]) -> ModularTokenizerResult<()> {
    let value = serde_json::to_value(tokens)
        .map_err(|e| ModularTokenizerError::ConfigError(format!("failed to serialize added_tokens: {e}")))?;
    doc.as_object_mut()
        .ok_or_else(|| ModularTokenizerError::ConfigError("tokenizer document is not an object".into()))?
        .insert("added_tokens".to_string(), value);
    Ok(())
}

pub fn get_vocab(doc: &Value) -> ModularTokenizerResult<HashMap<String, u32>> {
    let vocab = doc
        .pointer("/model/vocab")
        .ok_or_else(|| ModularTokenizerError::ConfigError("tokenizer document missing model.vocab".into()))?;
    serde_json::from_value(vocab.clone())
        .map_err(|e| ModularTokenizerError::ConfigError(format!("malformed model.vocab: {e}")))
}

pub fn set_vocab(doc: &mut Value, vocab: &IndexMap<String, u32>) -> ModularTokenizerResult<()> {
    let model = doc
        .get_mut("model")
        .and_then(|m| m.as_object_mut())
        .ok_or_else(|| ModularTokenizerError::ConfigError("tokenizer document missing model object".into()))?;
    let value = serde_json::to_value(vocab)
        .map_err(|e| ModularTokenizerError::ConfigError(format!("failed to serialize model.vocab: {e}")))?;
    model.insert("vocab".to_string(), value);
    Ok(())
}
