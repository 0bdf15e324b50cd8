//! Consistency Checker (C4).
//!
//! Verifies the invariants in §3 of the contract (I1-I3): shared special
//! tokens keep identical ids across every sub-tokenizer, no sub-tokenizer
//! duplicates an id internally, and no two sub-tokenizers' regular
//! vocabularies collide. Gates construction (C3) and every mutation (C8);
//! partial failure must never publish a half-mutated state (see §5).

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::descriptor::SubTokenizerState;
use crate::error::{ModularTokenizerError, ModularTokenizerResult};
use crate::json_vocab;

/// Runs T1-T3 against every sub-tokenizer in `sub_tokenizers`. A tokenizer
/// with fewer than two sub-tokenizers is vacuously consistent.
pub fn check(sub_tokenizers: &IndexMap<String, SubTokenizerState>) -> ModularTokenizerResult<()> {
    if sub_tokenizers.len() < 2 {
        return Ok(());
    }

    check_special_consistency(sub_tokenizers)?;
    check_no_collisions(sub_tokenizers)?;
    Ok(())
}

fn special_vocab(state: &SubTokenizerState) -> ModularTokenizerResult<HashMap<String, u32>> {
    let specials = json_vocab::get_added_tokens(&state.json_instance)?;
    Ok(specials.into_iter().map(|s| (s.content, s.id)).collect())
}

fn check_special_consistency(sub_tokenizers: &IndexMap<String, SubTokenizerState>) -> ModularTokenizerResult<()> {
    let mut iter = sub_tokenizers.values();
    let first = iter.next().expect("checked len >= 2 above");
    let reference = special_vocab(first)?;

    let mut offenders = Vec::new();
    for state in iter {
        let candidate = special_vocab(state)?;
        if candidate != reference {
            offenders.push(state.name().to_string());
        }
    }

    if offenders.is_empty() {
        Ok(())
    } else {
        Err(ModularTokenizerError::Inconsistent {
            reason: "special",
            offenders,
        })
    }
}

fn check_no_collisions(sub_tokenizers: &IndexMap<String, SubTokenizerState>) -> ModularTokenizerResult<()> {
    let mut duplicate_offenders = Vec::new();
    let mut collision_offenders = Vec::new();
    let mut all_regular_ids: HashSet<u32> = HashSet::new();

    for state in sub_tokenizers.values() {
        let vocab = json_vocab::get_vocab(&state.json_instance)?;
        let specials = json_vocab::get_added_tokens(&state.json_instance)?;
        let special_texts: HashSet<&str> = specials.iter().map(|s| s.content.as_str()).collect();

        let regular_ids: Vec<u32> = vocab
            .iter()
            .filter(|(text, _)| !special_texts.contains(text.as_str()))
            .map(|(_, id)| *id)
            .collect();
        let regular_id_set: HashSet<u32> = regular_ids.iter().copied().collect();

        if regular_ids.len() != regular_id_set.len() {
            duplicate_offenders.push(state.name().to_string());
        }

        let before = all_regular_ids.len();
        all_regular_ids.extend(&regular_id_set);
        if all_regular_ids.len() != before + regular_id_set.len() {
            collision_offenders.push(state.name().to_string());
        }
    }

    // Specials were already proven identical across sub-tokenizers by T1;
    // check only for duplicates within the (now shared) special set and
    // that it doesn't collide with the accumulated regular-id space.
    if let Some(first) = sub_tokenizers.values().next() {
        let specials = special_vocab(first)?;
        let special_ids: HashSet<u32> = specials.values().copied().collect();
        if special_ids.len() != specials.len() {
            duplicate_offenders.push("special".to_string());
        }
        let before = all_regular_ids.len();
        all_regular_ids.extend(&special_ids);
        if all_regular_ids.len() != before + special_ids.len() {
            collision_offenders.push("special".to_string());
        }
    }

    if !duplicate_offenders.is_empty() {
        return Err(ModularTokenizerError::Inconsistent {
            reason: "duplicate",
            offenders: duplicate_offenders,
        });
    }
    if !collision_offenders.is_empty() {
        return Err(ModularTokenizerError::Inconsistent {
            reason: "collision",
            offenders: collision_offenders,
        });
    }
    Ok(())
}
