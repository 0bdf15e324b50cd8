//! Typed-Input Parser (C6).
//!
//! Splits a directive-delimited user string such as
//! `<@TOKENIZER-TYPE=AA>ACG<@TOKENIZER-TYPE=SMILES>CNO` into ordered typed
//! segments. Unknown domain names are deferred to the Encoding Pipeline
//! (C7), which is the component that actually knows which domains exist.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ModularTokenizerError, ModularTokenizerResult};

static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@TOKENIZER-TYPE=([^>]*)>").expect("directive regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedSegment {
    pub domain: String,
    pub text: String,
    pub max_len: Option<u32>,
}

/// Parses `input` into an ordered list of typed segments. Every byte of
/// `input` must belong to some directive's span - text before the first
/// directive is a [`ModularTokenizerError::ParseError`].
pub fn parse(input: &str) -> ModularTokenizerResult<Vec<TypedSegment>> {
    let mut segments = Vec::new();
    let mut last_end = 0usize;
    let mut pending_domain: Option<String> = None;

    for caps in DIRECTIVE_RE.captures_iter(input) {
        let whole = caps.get(0).expect("capture group 0 always matches");
        let prelude = &input[last_end..whole.start()];

        if let Some(domain) = pending_domain.take() {
            segments.push(TypedSegment {
                domain,
                text: prelude.to_string(),
                max_len: None,
            });
        } else if !prelude.is_empty() {
            return Err(ModularTokenizerError::ParseError(
                "text before first directive".to_string(),
            ));
        }

        pending_domain = Some(caps[1].to_string());
        last_end = whole.end();
    }

    match pending_domain {
        Some(domain) => segments.push(TypedSegment {
            domain,
            text: input[last_end..].to_string(),
            max_len: None,
        }),
        None if !input.is_empty() => {
            return Err(ModularTokenizerError::ParseError(
                "text before first directive".to_string(),
            ));
        }
        None => {}
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_two_typed_segments() {
        let segments = parse("<@TOKENIZER-TYPE=AA>ACG<EOS><@TOKENIZER-TYPE=SMILES>CNO<EOS>").unwrap();
        assert_eq!(
            segments,
            vec![
                TypedSegment {
                    domain: "AA".into(),
                    text: "ACG<EOS>".into(),
                    max_len: None
                },
                TypedSegment {
                    domain: "SMILES".into(),
                    text: "CNO<EOS>".into(),
                    max_len: None
                },
            ]
        );
    }

    #[test]
    fn rejects_text_before_first_directive() {
        let err = parse("hello<@TOKENIZER-TYPE=AA>ACG").unwrap_err();
        assert!(matches!(err, ModularTokenizerError::ParseError(_)));
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert_eq!(parse("").unwrap(), vec![]);
    }

    #[test]
    fn empty_segment_body_is_allowed() {
        let segments = parse("<@TOKENIZER-TYPE=AA><@TOKENIZER-TYPE=SMILES>CNO").unwrap();
        assert_eq!(segments[0].text, "");
        assert_eq!(segments[1].text, "CNO");
    }
}
