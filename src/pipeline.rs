//! Encoding Pipeline (C7).
//!
//! Runs each typed segment through its matching adapter, merges the
//! per-segment encodings, applies global truncation, then pads. Sequence-id
//! stamping is treated as a contract of this pipeline rather than a direct
//! delegate to the underlying engine - see the "Ambiguous sequence-id
//! stamping" design note - because `set_sequence_id` on a fresh `Encoding`
//! only behaves when called with a monotonically increasing run of targets.

use indexmap::IndexMap;
use tokenizers::{Encoding, PaddingDirection, TruncationDirection};

use crate::decoder_index::{self, DecoderIndex};
use crate::descriptor::SubTokenizerState;
use crate::directive::TypedSegment;
use crate::error::{ModularTokenizerError, ModularTokenizerResult};

/// Resolved padding configuration for one call to [`encode_segments`].
#[derive(Debug, Clone, Default)]
pub struct PadConfig {
    pub pad_token_id: Option<u32>,
    pub pad_token: Option<String>,
    pub pad_type_id: u32,
}

pub fn encode_segments(
    sub_tokenizers: &IndexMap<String, SubTokenizerState>,
    segments: &[TypedSegment],
    max_len: Option<u32>,
    pad: PadConfig,
    decoder_index: &DecoderIndex,
) -> ModularTokenizerResult<Encoding> {
    let mut encoded_list = Vec::with_capacity(segments.len());

    for (index, segment) in segments.iter().enumerate() {
        let state = sub_tokenizers
            .get(&segment.domain)
            .ok_or_else(|| ModularTokenizerError::UnknownDomain(segment.domain.clone()))?;

        let mut encoding = state.engine_instance.encode(&segment.text)?;

        if let Some(segment_max_len) = segment.max_len {
            encoding.truncate(segment_max_len as usize, 0, TruncationDirection::Right);
        }

        if !encoding.get_overflowing().is_empty() {
            tracing::warn!(
                domain = %segment.domain,
                original_len = segment.text.chars().count(),
                max_len = segment.max_len,
                "segment truncated during encoding; overflowing tokens discarded"
            );
        }

        // The k-th segment (1-based) gets sequence id k. `set_sequence_id`
        // only reliably applies its target when called as a monotonic run
        // of increasing ids starting at 1.
        let sequence_id = index + 1;
        for id in 1..=sequence_id {
            encoding.set_sequence_id(id);
        }

        encoded_list.push(encoding);
    }

    let mut merged = Encoding::merge(encoded_list, true);

    if let Some(max_len) = max_len {
        merged.truncate(max_len as usize, 0, TruncationDirection::Right);
    }

    let (pad_token_id, pad_token) = resolve_pad_identifiers(pad.pad_token_id, pad.pad_token, decoder_index);

    match (pad_token_id, &pad_token, max_len) {
        (Some(pad_id), Some(pad_token), Some(max_len)) => {
            merged.pad(max_len as usize, pad_id, pad.pad_type_id, pad_token, PaddingDirection::Right);
        }
        (_, _, Some(max_len)) => {
            tracing::warn!(
                max_len,
                "padding skipped: could not resolve both a pad token and a pad id"
            );
        }
        _ => {}
    }

    Ok(merged)
}

/// If only one side of (pad_token_id, pad_token) is given, derives the
/// other from `decoder_index`. If neither is given, returns `(None, None)`
/// - the caller falls back to tokenizer-level state before getting here.
fn resolve_pad_identifiers(
    pad_token_id: Option<u32>,
    pad_token: Option<String>,
    decoder_index: &DecoderIndex,
) -> (Option<u32>, Option<String>) {
    match (pad_token_id, pad_token) {
        (Some(id), Some(token)) => (Some(id), Some(token)),
        (Some(id), None) => {
            let token = decoder_index.get(&id).map(|e| e.token.clone());
            (Some(id), token)
        }
        (None, Some(token)) => {
            let id = decoder_index::token_to_id(decoder_index, &token);
            (id, Some(token))
        }
        (None, None) => (None, None),
    }
}
