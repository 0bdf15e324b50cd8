use std::fs;
use std::path::Path;

use modular_tokenizer::descriptor::SubTokenizerDescriptor;
use modular_tokenizer::error::ModularTokenizerError;
use modular_tokenizer::tokenizer::{BuildParams, ModularTokenizer};

/// A minimal WordLevel tokenizer JSON fixture that splits its input on every
/// character, with the given regular vocab and no added tokens yet (the
/// assembler overwrites `added_tokens` itself).
fn char_level_fixture(vocab: &[(&str, u32)]) -> String {
    let entries: Vec<String> = vocab
        .iter()
        .map(|(text, id)| format!("{:?}: {id}", text))
        .collect();
    format!(
        r#"{{
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": {{"type": "Split", "pattern": {{"String": ""}}, "behavior": "Isolated", "invert": false}},
            "post_processor": null,
            "decoder": null,
            "model": {{
                "type": "WordLevel",
                "vocab": {{{}}},
                "unk_token": "<UNK>"
            }}
        }}"#,
        entries.join(", ")
    )
}

fn write_fixture(dir: &Path, name: &str, vocab: &[(&str, u32)]) -> SubTokenizerDescriptor {
    let path = dir.join(format!("{name}.json"));
    fs::write(&path, char_level_fixture(vocab)).unwrap();
    SubTokenizerDescriptor {
        name: name.to_string(),
        tokenizer_id: 0,
        json_path: Some(path),
        modular_json_path: dir.join(format!("{name}.modular.json")),
        max_len: None,
    }
}

fn build_aa_smiles(dir: &Path, max_special_token_id: Option<u32>) -> ModularTokenizer {
    let aa = write_fixture(dir, "AA", &[("A", 0), ("C", 1), ("G", 2)]);
    let smiles = write_fixture(dir, "SMILES", &[("C", 0), ("N", 1), ("O", 2)]);

    ModularTokenizer::build(BuildParams {
        tokenizer_descriptors: vec![aa, smiles],
        special_tokens: Some(vec!["<PAD>".into(), "<UNK>".into(), "<EOS>".into()]),
        additional_tokens: None,
        max_possible_token_id: None,
        max_special_token_id,
    })
    .unwrap()
}

#[test]
fn s1_builds_disjoint_id_space_without_special_budget() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), None);

    assert_eq!(tokenizer.token_to_id("<PAD>", None).unwrap(), Some(0));
    assert_eq!(tokenizer.token_to_id("<UNK>", None).unwrap(), Some(1));
    assert_eq!(tokenizer.token_to_id("<EOS>", None).unwrap(), Some(2));

    assert_eq!(tokenizer.token_to_id("A", Some("AA")).unwrap(), Some(3));
    assert_eq!(tokenizer.token_to_id("C", Some("AA")).unwrap(), Some(4));
    assert_eq!(tokenizer.token_to_id("G", Some("AA")).unwrap(), Some(5));

    assert_eq!(tokenizer.token_to_id("C", Some("SMILES")).unwrap(), Some(6));
    assert_eq!(tokenizer.token_to_id("N", Some("SMILES")).unwrap(), Some(7));
    assert_eq!(tokenizer.token_to_id("O", Some("SMILES")).unwrap(), Some(8));
}

#[test]
fn s2_regular_ids_start_after_special_budget() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), Some(9));

    assert_eq!(tokenizer.token_to_id("A", Some("AA")).unwrap(), Some(10));
}

#[test]
fn s3_encode_concatenates_segments_with_increasing_sequence_ids() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), None);

    let encoding = tokenizer
        .encode("<@TOKENIZER-TYPE=AA>ACG<@TOKENIZER-TYPE=SMILES>CNO", None, None, None, None)
        .unwrap();

    assert_eq!(encoding.get_ids(), &[3, 4, 5, 6, 7, 8]);

    let sequence_ids = encoding.get_sequence_ids();
    assert_eq!(sequence_ids.len(), 6);
    assert_eq!(sequence_ids[0], sequence_ids[1]);
    assert_eq!(sequence_ids[1], sequence_ids[2]);
    assert_eq!(sequence_ids[3], sequence_ids[4]);
    assert_eq!(sequence_ids[4], sequence_ids[5]);
    assert_ne!(sequence_ids[0], sequence_ids[3]);
}

#[test]
fn s4_token_to_id_without_domain_is_ambiguous_on_shared_text() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), None);

    let err = tokenizer.token_to_id("C", None).unwrap_err();
    assert!(matches!(err, ModularTokenizerError::AmbiguousToken { .. }));

    assert_eq!(tokenizer.token_to_id("C", Some("AA")).unwrap(), Some(4));
}

#[test]
fn encode_pad_override_wins_over_enable_padding_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut tokenizer = build_aa_smiles(dir.path(), None);

    // Configures tokenizer-level padding to <PAD> (id 0).
    tokenizer
        .enable_padding("right", Some(0), 0, Some("<PAD>".to_string()), Some(10))
        .unwrap();

    // A call-site override of only `pad_token_id` (to <UNK>, id 1) must not
    // be paired with the stale tokenizer-level `pad_token` ("<PAD>") - the
    // pipeline must derive "<UNK>" from id 1 via the reverse index instead.
    let encoding = tokenizer
        .encode("<@TOKENIZER-TYPE=AA>ACG", Some(10), Some(1), None, None)
        .unwrap();

    assert_eq!(encoding.get_ids().len(), 10);
    assert_eq!(&encoding.get_ids()[3..], &[1, 1, 1, 1, 1, 1, 1]);
    assert!(encoding.get_tokens()[3..].iter().all(|t| t == "<UNK>"));
}

#[test]
fn s5_add_special_tokens_respects_the_special_budget() {
    let dir = tempfile::tempdir().unwrap();
    let mut tokenizer = build_aa_smiles(dir.path(), Some(9));

    let added = tokenizer.add_special_tokens(vec!["<SEP>".into()]).unwrap();
    assert_eq!(added, 1);
    assert_eq!(tokenizer.token_to_id("<SEP>", None).unwrap(), Some(3));

    let err = tokenizer
        .add_special_tokens(vec![
            "<A>".into(), "<B>".into(), "<C>".into(), "<D>".into(),
            "<E>".into(), "<F>".into(), "<G>".into(), "<H>".into(),
        ])
        .unwrap_err();
    assert!(matches!(err, ModularTokenizerError::BudgetExceeded(_)));

    // A failed extension must not have mutated the tokenizer.
    assert_eq!(tokenizer.token_to_id("<SEP>", None).unwrap(), Some(3));
    assert_eq!(tokenizer.token_to_id("A", Some("AA")).unwrap(), Some(10));
}

#[test]
fn s6_decode_with_and_without_special_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), None);

    assert_eq!(tokenizer.decode(&[0, 3, 4, 5, 2], false), "<PAD>ACG<EOS>");
    assert_eq!(tokenizer.decode(&[0, 3, 4, 5, 2], true), "ACG");
}

#[test]
fn add_special_tokens_rejects_promoting_an_existing_regular_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut tokenizer = build_aa_smiles(dir.path(), None);

    let err = tokenizer.add_special_tokens(vec!["A".into()]).unwrap_err();
    assert!(matches!(err, ModularTokenizerError::NameCollision { .. }));
}

#[test]
fn save_then_load_round_trips_the_id_layout() {
    let build_dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(build_dir.path(), Some(9));

    let save_dir = tempfile::tempdir().unwrap();
    tokenizer.save(save_dir.path()).unwrap();

    let loaded = ModularTokenizer::load(save_dir.path()).unwrap();

    assert_eq!(loaded.token_to_id("A", Some("AA")).unwrap(), Some(10));
    assert_eq!(loaded.token_to_id("<PAD>", None).unwrap(), Some(0));
    assert_eq!(loaded.get_vocab_size(), tokenizer.get_vocab_size());
}

#[test]
fn encode_fails_on_text_before_first_directive() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), None);

    let err = tokenizer.encode("oops<@TOKENIZER-TYPE=AA>ACG", None, None, None, None).unwrap_err();
    assert!(matches!(err, ModularTokenizerError::ParseError(_)));
}

#[test]
fn encode_fails_on_unknown_domain() {
    let dir = tempfile::tempdir().unwrap();
    let tokenizer = build_aa_smiles(dir.path(), None);

    let err = tokenizer
        .encode("<@TOKENIZER-TYPE=PROTEIN>ACG", None, None, None, None)
        .unwrap_err();
    assert!(matches!(err, ModularTokenizerError::UnknownDomain(_)));
}
