//! Reverse Index (C5): global id -> (token text, is_special).
//!
//! Rebuilt from scratch by C3 (initial assembly) and C8 (after adding
//! special tokens); powers [`crate::tokenizer::ModularTokenizer::decode`]
//! and [`crate::tokenizer::ModularTokenizer::id_to_token`].

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::descriptor::SubTokenizerState;
use crate::error::ModularTokenizerResult;
use crate::json_vocab;

#[derive(Debug, Clone)]
pub struct DecoderEntry {
    pub token: String,
    pub is_special: bool,
}

pub type DecoderIndex = HashMap<u32, DecoderEntry>;

/// Walks every sub-tokenizer in order: the first contributes its specials
/// (`is_special = true`) before anyone's regulars are added, then every
/// sub-tokenizer (including the first) contributes its regulars. I5
/// guarantees no collision except for specials, which are naturally skipped
/// since only the first sub-tokenizer ever inserts them.
pub fn rebuild(sub_tokenizers: &IndexMap<String, SubTokenizerState>) -> ModularTokenizerResult<DecoderIndex> {
    let mut index = DecoderIndex::new();

    if let Some(first) = sub_tokenizers.values().next() {
        let specials = json_vocab::get_added_tokens(&first.json_instance)?;
        let special_texts: std::collections::HashSet<&str> =
            specials.iter().map(|s| s.content.as_str()).collect();
        let vocab = json_vocab::get_vocab(&first.json_instance)?;
        let special_vocab: HashMap<String, u32> = vocab
            .iter()
            .filter(|(text, _)| special_texts.contains(text.as_str()))
            .map(|(text, id)| (text.clone(), *id))
            .collect();
        insert_all(&mut index, special_vocab, true);
    }

    for state in sub_tokenizers.values() {
        let specials = json_vocab::get_added_tokens(&state.json_instance)?;
        let special_texts: std::collections::HashSet<&str> =
            specials.iter().map(|s| s.content.as_str()).collect();
        let vocab = json_vocab::get_vocab(&state.json_instance)?;
        let regular_vocab: HashMap<String, u32> = vocab
            .into_iter()
            .filter(|(text, _)| !special_texts.contains(text.as_str()))
            .collect();
        insert_all(&mut index, regular_vocab, false);
    }

    Ok(index)
}

/// Reverse lookup: the first id whose entry's token text equals `token`.
/// Used only to resolve padding identifiers, where the caller supplied one
/// side (token or id) and we need the other.
pub fn token_to_id(index: &DecoderIndex, token: &str) -> Option<u32> {
    index
        .iter()
        .find(|(_, entry)| entry.token == token)
        .map(|(id, _)| *id)
}

fn insert_all(index: &mut DecoderIndex, vocab: HashMap<String, u32>, is_special: bool) {
    for (token, id) in vocab {
        if index.contains_key(&id) {
            tracing::warn!(
                id,
                token,
                "decoder_index collision during rebuild; keeping first entry (this signals a consistency check should have caught it)"
            );
            continue;
        }
        index.insert(id, DecoderEntry { token, is_special });
    }
}
