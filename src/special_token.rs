//! The shared special-token record and the small helpers that build lists of
//! them. Mirrors the `added_tokens` entries of a `tokenizers` JSON document,
//! so these round-trip losslessly through [`crate::adapter`].

use serde::{Deserialize, Serialize};
use tokenizers::AddedToken;

/// One entry of a sub-tokenizer's `added_tokens` array.
///
/// Invariant: `content` is unique across the union of all special records
/// belonging to one [`crate::tokenizer::ModularTokenizer`] (I1 in the data
/// model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokenRecord {
    pub id: u32,
    pub content: String,
    #[serde(default)]
    pub single_word: bool,
    #[serde(default)]
    pub lstrip: bool,
    #[serde(default)]
    pub rstrip: bool,
    #[serde(default)]
    pub normalized: bool,
    #[serde(default = "default_true")]
    pub special: bool,
}

fn default_true() -> bool {
    true
}

impl SpecialTokenRecord {
    pub fn new(id: u32, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            single_word: false,
            lstrip: false,
            rstrip: false,
            normalized: false,
            special: true,
        }
    }
}

impl From<&SpecialTokenRecord> for AddedToken {
    fn from(record: &SpecialTokenRecord) -> Self {
        AddedToken {
            content: record.content.clone(),
            single_word: record.single_word,
            lstrip: record.lstrip,
            rstrip: record.rstrip,
            normalized: record.normalized,
            special: record.special,
        }
    }
}

/// Builds a list of [`SpecialTokenRecord`]s with consecutive IDs starting at
/// `starting_index`, in the order `contents` is given. Mirrors
/// `ModularTokenizer.build_special_token_list` from the source
/// implementation.
pub fn build_special_token_list<I, S>(contents: I, starting_index: u32) -> Vec<SpecialTokenRecord>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    contents
        .into_iter()
        .enumerate()
        .map(|(i, content)| SpecialTokenRecord::new(starting_index + i as u32, content))
        .collect()
}
