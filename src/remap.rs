//! Vocabulary Remapper (C2).
//!
//! Pure function: given a raw vocab, the set of special tokens that must
//! keep their id, and a starting id, produces a new vocab whose specials
//! keep their ids and whose regulars are renumbered contiguously from
//! `start`, preserving the original frequency-implied order (I6).

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

/// Output of [`remap_vocab`]: the new vocab (specials + renumbered
/// regulars) and the next free id a caller can use for whatever comes next.
pub struct RemapOutput {
    pub vocab: IndexMap<String, u32>,
    pub next_free_id: u32,
}

/// Remaps `vocab` so that every token in `special_ids_by_content` keeps its
/// given id, and every other ("regular") token is renumbered starting at
/// `start`, in ascending order of its original id.
///
/// If `start` is `None`, it defaults to `max(special ids) + 1` (or `0` if
/// there are no specials).
pub fn remap_vocab(
    vocab: &HashMap<String, u32>,
    special_ids_by_content: &HashMap<String, u32>,
    start: Option<u32>,
) -> RemapOutput {
    let start = start.unwrap_or_else(|| {
        special_ids_by_content
            .values()
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    });

    let special_texts: HashSet<&str> = special_ids_by_content.keys().map(String::as_str).collect();

    let mut regulars: Vec<(&String, &u32)> = vocab
        .iter()
        .filter(|(text, _)| !special_texts.contains(text.as_str()))
        .collect();
    // Stable sort by original id ascending - preserves whatever
    // frequency-implied order the source tokenizer trained.
    regulars.sort_by_key(|(_, id)| **id);

    let mut out = IndexMap::with_capacity(special_ids_by_content.len() + regulars.len());
    for (content, id) in special_ids_by_content {
        out.insert(content.clone(), *id);
    }

    let mut next_id = start;
    for (text, _) in &regulars {
        out.insert((*text).clone(), next_id);
        next_id += 1;
    }

    let next_free_id = if regulars.is_empty() { start } else { next_id };

    RemapOutput {
        vocab: out,
        next_free_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn remaps_regulars_preserving_order_with_explicit_start() {
        let vocab = map(&[("A", 0), ("C", 1), ("G", 2)]);
        let specials = map(&[("<PAD>", 0), ("<UNK>", 1), ("<EOS>", 2)]);

        let out = remap_vocab(&vocab, &specials, Some(3));

        assert_eq!(out.vocab.get("A"), Some(&3));
        assert_eq!(out.vocab.get("C"), Some(&4));
        assert_eq!(out.vocab.get("G"), Some(&5));
        assert_eq!(out.vocab.get("<PAD>"), Some(&0));
        assert_eq!(out.next_free_id, 6);
    }

    #[test]
    fn defaults_start_to_one_past_max_special_id() {
        let vocab = map(&[("x", 5), ("y", 1)]);
        let specials = map(&[("<PAD>", 0), ("<UNK>", 1)]);

        let out = remap_vocab(&vocab, &specials, None);

        // y had the smaller original id, so it gets the smaller new id.
        assert_eq!(out.vocab.get("y"), Some(&2));
        assert_eq!(out.vocab.get("x"), Some(&3));
        assert_eq!(out.next_free_id, 4);
    }

    #[test]
    fn drops_vocab_entries_that_collide_with_special_content() {
        let vocab = map(&[("<PAD>", 7), ("A", 0)]);
        let specials = map(&[("<PAD>", 0)]);

        let out = remap_vocab(&vocab, &specials, Some(1));

        assert_eq!(out.vocab.get("<PAD>"), Some(&0));
        assert_eq!(out.vocab.get("A"), Some(&1));
    }

    #[test]
    fn empty_vocab_keeps_start_as_next_free_id() {
        let vocab = HashMap::new();
        let specials = map(&[("<PAD>", 0)]);

        let out = remap_vocab(&vocab, &specials, Some(1));
        assert_eq!(out.next_free_id, 1);
    }
}
