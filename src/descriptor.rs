//! Configuration and runtime state for a single sub-tokenizer.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::adapter::SubTokenizerAdapter;

/// Static configuration for one sub-tokenizer, as it appears in
/// `config.yaml`'s `tokenizers_info` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTokenizerDescriptor {
    /// Unique key; also the `NAME` expected after `<@TOKENIZER-TYPE=`.
    pub name: String,
    /// Carried through config for parity with the source sub-tokenizer's own
    /// id. Not consulted by the encoding pipeline - segment sequence-ids are
    /// derived purely from position (see `pipeline::encode_segments`).
    pub tokenizer_id: u32,
    /// Source JSON before remap. Required on the fresh-build path, absent
    /// on the load path.
    #[serde(default)]
    pub json_path: Option<PathBuf>,
    /// Post-remap JSON; always present.
    pub modular_json_path: PathBuf,
    /// Per-domain truncation cap.
    #[serde(default)]
    pub max_len: Option<u32>,
}

/// The full `config.yaml` manifest (see §6 of the contract: External
/// Interfaces).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    pub tokenizers_info: Vec<SubTokenizerDescriptor>,
    #[serde(default)]
    pub max_possible_token_id: Option<u32>,
    #[serde(default)]
    pub max_special_token_id: Option<u32>,
}

/// Everything the descriptor has, plus the live engine handle and the JSON
/// document that must stay in lockstep with it (see §3, `SubTokenizerState`).
pub struct SubTokenizerState {
    pub descriptor: SubTokenizerDescriptor,
    pub json_instance: serde_json::Value,
    pub engine_instance: SubTokenizerAdapter,
}

impl SubTokenizerState {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}
