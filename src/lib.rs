//! Composes independently trained sub-tokenizers into a single
//! [`tokenizer::ModularTokenizer`] with one non-overlapping integer id space.
//!
//! A modular tokenizer owns no vocabulary of its own: it assembles
//! `N` already-trained `tokenizers::Tokenizer` instances (one per domain,
//! e.g. protein sequence, SMILES, natural-language tags), remaps their
//! regular vocabularies into disjoint id bands, and shares one special-token
//! block across all of them. Callers route text to the right sub-tokenizer
//! either by calling [`tokenizer::ModularTokenizer::encode_list`] directly or
//! by embedding `<@TOKENIZER-TYPE=NAME>` directives in a single string passed
//! to [`tokenizer::ModularTokenizer::encode`].

pub mod adapter;
pub mod consistency;
pub mod decoder_index;
pub mod descriptor;
pub mod directive;
pub mod error;
pub mod json_vocab;
pub mod persistence;
pub mod pipeline;
pub mod remap;
pub mod special_token;
pub mod tokenizer;

pub use error::{ModularTokenizerError, ModularTokenizerResult};
pub use tokenizer::{BuildParams, ModularTokenizer};
