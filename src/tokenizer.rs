//! Modular Assembler (C3), Dynamic Special-Token Extension (C8), and the
//! public [`ModularTokenizer`] surface.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use tokenizers::Encoding;

use crate::adapter::SubTokenizerAdapter;
use crate::consistency;
use crate::decoder_index::{self, DecoderIndex};
use crate::descriptor::{ManifestConfig, SubTokenizerDescriptor, SubTokenizerState};
use crate::directive;
use crate::error::{ModularTokenizerError, ModularTokenizerResult};
use crate::json_vocab;
use crate::persistence;
use crate::pipeline::{self, PadConfig};
use crate::remap;
use crate::special_token::{self, SpecialTokenRecord};

/// Parameters for a fresh build ([`ModularTokenizer::build`]). See §4.3.
#[derive(Default)]
pub struct BuildParams {
    pub tokenizer_descriptors: Vec<SubTokenizerDescriptor>,
    pub special_tokens: Option<Vec<String>>,
    pub additional_tokens: Option<Vec<String>>,
    pub max_possible_token_id: Option<u32>,
    pub max_special_token_id: Option<u32>,
}

pub struct ModularTokenizer {
    sub_tokenizers: IndexMap<String, SubTokenizerState>,
    common_specials: Vec<SpecialTokenRecord>,
    max_possible_token_id: Option<u32>,
    max_special_token_id: Option<u32>,
    max_len: Option<u32>,
    pad_token: Option<String>,
    pad_token_id: Option<u32>,
    pad_token_type_id: u32,
    decoder_index: DecoderIndex,
}

impl ModularTokenizer {
    /// Fresh-build path (`load_adjusted = false` in the contract): takes
    /// source JSONs, computes the shared special-token block, remaps every
    /// sub-tokenizer's regular vocab into the unified id space.
    pub fn build(params: BuildParams) -> ModularTokenizerResult<Self> {
        let mut all_special_texts: Vec<String> = Vec::new();
        all_special_texts.extend(params.special_tokens.into_iter().flatten());
        all_special_texts.extend(params.additional_tokens.into_iter().flatten());

        let mut jsons = Vec::with_capacity(params.tokenizer_descriptors.len());
        for descriptor in &params.tokenizer_descriptors {
            let path = descriptor
                .json_path
                .as_ref()
                .ok_or_else(|| ModularTokenizerError::ConfigError(format!(
                    "sub-tokenizer '{}' has no json_path for a fresh build",
                    descriptor.name
                )))?;
            let json = read_json_file(path)?;
            for record in json_vocab::get_added_tokens(&json)? {
                if !all_special_texts.contains(&record.content) {
                    all_special_texts.push(record.content);
                }
            }
            jsons.push(json);
        }

        let common_specials = special_token::build_special_token_list(all_special_texts, 0);
        let mut next = common_specials.len() as u32;

        if let Some(max_special) = params.max_special_token_id {
            if next > max_special + 1 {
                return Err(ModularTokenizerError::ConfigError(format!(
                    "max_special_token_id {max_special} is too small to contain all {next} special tokens"
                )));
            }
            next = max_special + 1;
        }

        let special_ids_by_content: HashMap<String, u32> = common_specials
            .iter()
            .map(|s| (s.content.clone(), s.id))
            .collect();

        for json in &mut jsons {
            json_vocab::set_added_tokens(json, &common_specials)?;
            let vocab = json_vocab::get_vocab(json)?;
            let remapped = remap::remap_vocab(&vocab, &special_ids_by_content, Some(next));
            json_vocab::set_vocab(json, &remapped.vocab)?;
            next = remapped.next_free_id;
        }

        // build_common re-derives common_specials from the first
        // sub-tokenizer, which we just made consistent with `common_specials`.
        Self::build_common(
            params.tokenizer_descriptors,
            jsons,
            params.max_possible_token_id,
            params.max_special_token_id,
        )
    }

    /// Load path (`load_adjusted = true` in the contract): descriptors point
    /// at already-remapped JSONs, so no remapping happens here.
    pub fn build_loaded(
        tokenizer_descriptors: Vec<SubTokenizerDescriptor>,
        max_possible_token_id: Option<u32>,
        max_special_token_id: Option<u32>,
    ) -> ModularTokenizerResult<Self> {
        let mut jsons = Vec::with_capacity(tokenizer_descriptors.len());
        for descriptor in &tokenizer_descriptors {
            jsons.push(read_json_file(&descriptor.modular_json_path)?);
        }
        Self::build_common(tokenizer_descriptors, jsons, max_possible_token_id, max_special_token_id)
    }

    fn build_common(
        descriptors: Vec<SubTokenizerDescriptor>,
        jsons: Vec<serde_json::Value>,
        max_possible_token_id: Option<u32>,
        max_special_token_id: Option<u32>,
    ) -> ModularTokenizerResult<Self> {
        let mut sub_tokenizers = IndexMap::with_capacity(descriptors.len());

        for (descriptor, mut json) in descriptors.into_iter().zip(jsons) {
            let serialized = serde_json::to_string(&json).map_err(|e| ModularTokenizerError::Json {
                path: descriptor.modular_json_path.clone(),
                source: e,
            })?;
            let mut engine = SubTokenizerAdapter::from_json_str(&serialized)?;
            if let Some(max_len) = descriptor.max_len {
                engine.enable_truncation(max_len as usize)?;
            }
            let round_tripped = engine.serialize()?;
            json = serde_json::from_str(&round_tripped).map_err(|e| ModularTokenizerError::Json {
                path: descriptor.modular_json_path.clone(),
                source: e,
            })?;

            let name = descriptor.name.clone();
            sub_tokenizers.insert(
                name,
                SubTokenizerState {
                    descriptor,
                    json_instance: json,
                    engine_instance: engine,
                },
            );
        }

        consistency::check(&sub_tokenizers)?;

        let common_specials = match sub_tokenizers.values().next() {
            Some(first) => json_vocab::get_added_tokens(&first.json_instance)?,
            None => Vec::new(),
        };

        let decoder_index = decoder_index::rebuild(&sub_tokenizers)?;

        if let Some(max_possible) = max_possible_token_id {
            if let Some(&observed_max) = decoder_index.keys().max() {
                if observed_max > max_possible {
                    return Err(ModularTokenizerError::BudgetExceeded(format!(
                        "remapping produced id {observed_max} above max_possible_token_id {max_possible}"
                    )));
                }
            }
        }

        Ok(Self {
            sub_tokenizers,
            common_specials,
            max_possible_token_id,
            max_special_token_id,
            max_len: None,
            pad_token: None,
            pad_token_id: None,
            pad_token_type_id: 0,
            decoder_index,
        })
    }

    /// Dynamic Special-Token Extension (C8).
    pub fn add_special_tokens(&mut self, tokens: Vec<String>) -> ModularTokenizerResult<usize> {
        let existing: HashSet<String> = self.common_specials.iter().map(|s| s.content.clone()).collect();
        let candidates: Vec<String> = tokens.into_iter().filter(|t| !existing.contains(t)).collect();

        let colliding: Vec<String> = candidates
            .iter()
            .filter(|t| {
                self.decoder_index
                    .values()
                    .any(|entry| !entry.is_special && &entry.token == *t)
            })
            .cloned()
            .collect();
        if !colliding.is_empty() {
            return Err(ModularTokenizerError::NameCollision { texts: colliding });
        }

        if candidates.is_empty() {
            return Ok(0);
        }

        let start = if let Some(max_special) = self.max_special_token_id {
            let next = self
                .common_specials
                .iter()
                .map(|s| s.id)
                .max()
                .map(|m| m + 1)
                .unwrap_or(0);
            if max_special + 1 < next + candidates.len() as u32 {
                return Err(ModularTokenizerError::BudgetExceeded(format!(
                    "only {} special ids remain below max_special_token_id {max_special}, need {}",
                    max_special as i64 + 1 - next as i64,
                    candidates.len()
                )));
            }
            next
        } else {
            let next = self.max_mapped_id().map(|m| m + 1).unwrap_or(0);
            if let Some(max_possible) = self.max_possible_token_id {
                if max_possible + 1 < next + candidates.len() as u32 {
                    return Err(ModularTokenizerError::BudgetExceeded(format!(
                        "only {} ids remain below max_possible_token_id {max_possible}, need {}",
                        max_possible as i64 + 1 - next as i64,
                        candidates.len()
                    )));
                }
            }
            next
        };

        let new_records = special_token::build_special_token_list(candidates, start);

        let mut scratch = IndexMap::with_capacity(self.sub_tokenizers.len());
        for (name, state) in &self.sub_tokenizers {
            let mut json = state.json_instance.clone();

            let mut added_tokens = json_vocab::get_added_tokens(&json)?;
            added_tokens.extend(new_records.iter().cloned());
            json_vocab::set_added_tokens(&mut json, &added_tokens)?;

            let mut vocab = json_vocab::get_vocab(&json)?;
            for record in &new_records {
                vocab.insert(record.content.clone(), record.id);
            }
            let mut sorted: Vec<(String, u32)> = vocab.into_iter().collect();
            sorted.sort_by_key(|(_, id)| *id);
            let ordered: indexmap::IndexMap<String, u32> = sorted.into_iter().collect();
            json_vocab::set_vocab(&mut json, &ordered)?;

            let serialized = serde_json::to_string(&json).map_err(|e| ModularTokenizerError::Json {
                path: state.descriptor.modular_json_path.clone(),
                source: e,
            })?;
            let mut engine = SubTokenizerAdapter::from_json_str(&serialized)?;
            if let Some(max_len) = state.descriptor.max_len {
                engine.enable_truncation(max_len as usize)?;
            }
            let round_tripped = engine.serialize()?;
            json = serde_json::from_str(&round_tripped).map_err(|e| ModularTokenizerError::Json {
                path: state.descriptor.modular_json_path.clone(),
                source: e,
            })?;

            scratch.insert(
                name.clone(),
                SubTokenizerState {
                    descriptor: state.descriptor.clone(),
                    json_instance: json,
                    engine_instance: engine,
                },
            );
        }

        consistency::check(&scratch)?;
        let decoder_index = decoder_index::rebuild(&scratch)?;

        self.sub_tokenizers = scratch;
        self.common_specials.extend(new_records.clone());
        self.decoder_index = decoder_index;

        Ok(new_records.len())
    }

    fn max_mapped_id(&self) -> Option<u32> {
        self.decoder_index.keys().max().copied()
    }

    pub fn encode(
        &self,
        sequence: &str,
        max_len: Option<u32>,
        pad_token_id: Option<u32>,
        pad_token: Option<String>,
        pad_type_id: Option<u32>,
    ) -> ModularTokenizerResult<Encoding> {
        let segments = directive::parse(sequence)?;
        self.encode_segments(&segments, max_len, pad_token_id, pad_token, pad_type_id)
    }

    pub fn encode_list(
        &self,
        typed_input_list: Vec<(String, String, Option<u32>)>,
        max_len: Option<u32>,
        pad_token_id: Option<u32>,
        pad_token: Option<String>,
        pad_type_id: Option<u32>,
    ) -> ModularTokenizerResult<Encoding> {
        let segments: Vec<directive::TypedSegment> = typed_input_list
            .into_iter()
            .map(|(domain, text, max_len)| directive::TypedSegment { domain, text, max_len })
            .collect();
        self.encode_segments(&segments, max_len, pad_token_id, pad_token, pad_type_id)
    }

    fn encode_segments(
        &self,
        segments: &[directive::TypedSegment],
        max_len: Option<u32>,
        pad_token_id: Option<u32>,
        pad_token: Option<String>,
        pad_type_id: Option<u32>,
    ) -> ModularTokenizerResult<Encoding> {
        let effective_max_len = max_len.or(self.max_len);
        // Tokenizer-level pad state only substitutes as a pair: if the
        // caller gave either side, the other must be derived from it (via
        // the reverse index, in `pipeline::resolve_pad_identifiers`), not
        // patched in from whatever `enable_padding` last configured.
        let (pad_token_id, pad_token) = if pad_token_id.is_none() && pad_token.is_none() {
            (self.pad_token_id, self.pad_token.clone())
        } else {
            (pad_token_id, pad_token)
        };
        let pad = PadConfig {
            pad_token_id,
            pad_token,
            pad_type_id: pad_type_id.unwrap_or(self.pad_token_type_id),
        };
        pipeline::encode_segments(&self.sub_tokenizers, segments, effective_max_len, pad, &self.decoder_index)
    }

    pub fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> String {
        ids.iter()
            .filter_map(|id| match self.decoder_index.get(id) {
                Some(entry) if skip_special_tokens && entry.is_special => None,
                Some(entry) => Some(entry.token.clone()),
                None => Some(format!("<@TOKEN_MISSING-{id}>")),
            })
            .collect()
    }

    /// Without a domain, returns a unique id across every sub-tokenizer or
    /// fails [`ModularTokenizerError::AmbiguousToken`] if more than one
    /// distinct id is found.
    pub fn token_to_id(&self, token: &str, domain: Option<&str>) -> ModularTokenizerResult<Option<u32>> {
        match domain {
            Some(domain) => {
                let state = self
                    .sub_tokenizers
                    .get(domain)
                    .ok_or_else(|| ModularTokenizerError::UnknownDomain(domain.to_string()))?;
                Ok(state.engine_instance.token_to_id(token))
            }
            None => {
                let mut ids = Vec::new();
                let mut domains = Vec::new();
                for (name, state) in &self.sub_tokenizers {
                    if let Some(id) = state.engine_instance.token_to_id(token) {
                        ids.push(id);
                        domains.push(name.clone());
                    }
                }
                let unique: HashSet<u32> = ids.iter().copied().collect();
                match unique.len() {
                    0 => Ok(None),
                    1 => Ok(unique.into_iter().next()),
                    _ => Err(ModularTokenizerError::AmbiguousToken {
                        token: token.to_string(),
                        ids,
                        domains,
                    }),
                }
            }
        }
    }

    pub fn id_to_token(&self, id: u32) -> Option<String> {
        self.decoder_index.get(&id).map(|e| e.token.clone())
    }

    pub fn get_added_vocab(&self) -> HashMap<String, u32> {
        self.common_specials.iter().map(|s| (s.content.clone(), s.id)).collect()
    }

    pub fn get_vocab_size(&self) -> usize {
        self.decoder_index.len()
    }

    /// Highest id that has a token mapped to it.
    pub fn get_max_id(&self) -> Option<u32> {
        self.max_mapped_id()
    }

    /// Highest id the tokenizer could ever produce. If `max_possible_token_id`
    /// was configured, this returns that bound even when no token is
    /// actually mapped to it yet - a placeholder upper bound, not a
    /// guarantee that the id is in use.
    pub fn get_max_token_id(&self) -> Option<u32> {
        if let Some(max_possible) = self.max_possible_token_id {
            tracing::warn!(
                max_possible_token_id = max_possible,
                "get_max_token_id returning the configured upper bound, which may exceed any id actually in use"
            );
            return Some(max_possible);
        }
        self.max_mapped_id()
    }

    pub fn enable_padding(
        &mut self,
        direction: &str,
        pad_id: Option<u32>,
        pad_type_id: u32,
        pad_token: Option<String>,
        length: Option<u32>,
    ) -> ModularTokenizerResult<()> {
        if direction != "right" {
            return Err(ModularTokenizerError::Unsupported(format!(
                "padding direction '{direction}' is not implemented, only 'right'"
            )));
        }
        if pad_token.is_none() && pad_id.is_none() {
            return Err(ModularTokenizerError::ConfigError(
                "enable_padding requires at least one of pad_token or pad_id".to_string(),
            ));
        }
        if let (Some(token), Some(id)) = (&pad_token, pad_id) {
            if self.token_to_id(token, None)? != Some(id) {
                return Err(ModularTokenizerError::ConfigError(format!(
                    "pad_token '{token}' does not correspond to pad_id {id}"
                )));
            }
        }

        let resolved_id = match pad_id {
            Some(id) => Some(id),
            None => pad_token.as_deref().and_then(|t| self.id_to_token_inverse(t)),
        };
        let resolved_token = match &pad_token {
            Some(t) => Some(t.clone()),
            None => resolved_id.and_then(|id| self.id_to_token(id)),
        };

        self.pad_token_type_id = pad_type_id;
        self.pad_token = resolved_token;
        self.pad_token_id = resolved_id;
        self.max_len = length;
        Ok(())
    }

    fn id_to_token_inverse(&self, token: &str) -> Option<u32> {
        decoder_index::token_to_id(&self.decoder_index, token)
    }

    pub fn enable_truncation(
        &mut self,
        max_length: u32,
        stride: u32,
        strategy: &str,
        direction: &str,
        pad_to_multiple_of: Option<u32>,
    ) -> ModularTokenizerResult<()> {
        if stride != 0 {
            return Err(ModularTokenizerError::Unsupported("stride is not implemented".to_string()));
        }
        if strategy != "longest_first" {
            return Err(ModularTokenizerError::Unsupported(format!(
                "truncation strategy '{strategy}' is not implemented"
            )));
        }
        if direction != "right" {
            return Err(ModularTokenizerError::Unsupported(format!(
                "truncation direction '{direction}' is not implemented"
            )));
        }
        if pad_to_multiple_of.is_some() {
            return Err(ModularTokenizerError::Unsupported("pad_to_multiple_of is not implemented".to_string()));
        }
        self.max_len = Some(max_length);
        Ok(())
    }

    pub fn save(&self, dir: impl AsRef<Path>) -> ModularTokenizerResult<()> {
        let dir = dir.as_ref();
        persistence::ensure_dir(dir)?;

        let mut descriptors = Vec::with_capacity(self.sub_tokenizers.len());
        for state in self.sub_tokenizers.values() {
            let bare = persistence::bare_filenames(&state.descriptor);
            let out_path = dir.join(&bare.modular_json_path);
            state.engine_instance.save(&out_path)?;
            descriptors.push(SubTokenizerDescriptor {
                json_path: None,
                ..bare
            });
        }

        let manifest = ManifestConfig {
            tokenizers_info: descriptors,
            max_possible_token_id: self.max_possible_token_id,
            max_special_token_id: self.max_special_token_id,
        };
        persistence::write_manifest(dir, &manifest)
    }

    pub fn load(dir: impl AsRef<Path>) -> ModularTokenizerResult<Self> {
        let dir = dir.as_ref();
        let mut manifest = persistence::read_manifest(dir)?;
        persistence::rewrite_paths_under(&mut manifest, dir);
        Self::build_loaded(
            manifest.tokenizers_info,
            manifest.max_possible_token_id,
            manifest.max_special_token_id,
        )
    }

    pub fn from_file(path: impl AsRef<Path>) -> ModularTokenizerResult<Self> {
        let path = path.as_ref();
        let dir = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        Self::load(dir)
    }
}

fn read_json_file(path: &Path) -> ModularTokenizerResult<serde_json::Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| ModularTokenizerError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&contents).map_err(|e| ModularTokenizerError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}
