use crate::clean::clean;
use crate::error::NormalizeError;
use crate::expand::{AbbreviationMap, ContractionMap};
use crate::lemma::Lemmatizer;
use crate::stopwords::is_stopword;
use crate::tokenizer::word_tokenize;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use serde_json::Value;

lazy_static! {
    static ref DEFAULT_NORMALIZER: Normalizer = Normalizer::default();
}

/// Upper bound on re-normalization rounds in [`Normalizer::prepare`].
const MAX_PASSES: usize = 8;

/// Independently toggleable pipeline steps. The order of the steps is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub remove_numbers: bool,
    pub remove_stopwords: bool,
    pub apply_lemmatization: bool,
    pub remove_contractions: bool,
    pub remove_abbreviations: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            remove_numbers: false,
            remove_stopwords: true,
            apply_lemmatization: true,
            remove_contractions: true,
            remove_abbreviations: true,
        }
    }
}

/// Turns raw text into normalized tokens.
///
/// Holds the fixed dictionaries, built once and only read afterwards, so a
/// single instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct Normalizer {
    abbreviations: AbbreviationMap,
    contractions: ContractionMap,
    lemmatizer: Lemmatizer,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(AbbreviationMap::default())
    }
}

impl Normalizer {
    pub fn new(abbreviations: AbbreviationMap) -> Self {
        Self {
            abbreviations,
            contractions: ContractionMap::new(),
            lemmatizer: Lemmatizer::new(),
        }
    }

    /// Clean, expand abbreviations then contractions, tokenize, drop
    /// stopwords, lemmatize. Token order follows the input.
    ///
    /// The output is a fixed point: feeding the joined tokens back in returns
    /// them unchanged. Read without its original neighbours a lemma can be
    /// tagged differently and reduce further, or land on a stopword, so the
    /// pipeline is rerun on its own output until nothing moves.
    pub fn prepare(&self, text: &str, options: &NormalizeOptions) -> Vec<String> {
        let mut tokens = self.pass(text, options);
        for _ in 0..MAX_PASSES {
            let again = self.pass(&tokens.join(" "), options);
            if again == tokens {
                return tokens;
            }
            tokens = again;
        }
        tracing::warn!(text, ?tokens, "normalization did not settle");
        tokens
    }

    fn pass(&self, text: &str, options: &NormalizeOptions) -> Vec<String> {
        let mut text = clean(text, options.remove_numbers);
        if options.remove_abbreviations {
            text = self.abbreviations.expand(&text);
        }
        if options.remove_contractions {
            text = self.contractions.expand(&text);
        }
        let mut tokens = word_tokenize(&text);
        if options.remove_stopwords {
            tokens.retain(|t| !is_stopword(t));
        }
        if options.apply_lemmatization {
            tokens = self.lemmatizer.lemmatize_tokens(&tokens);
        }
        tokens
    }

    /// [`Normalizer::prepare`] for values of unknown type, such as request
    /// bodies. Anything but a JSON string is rejected.
    pub fn prepare_value(&self, value: &Value, options: &NormalizeOptions) -> Result<Vec<String>, NormalizeError> {
        Ok(self.prepare(expect_str(value)?, options))
    }
}

/// Borrow the string inside `value`, or report what was found instead.
pub fn expect_str(value: &Value) -> Result<&str, NormalizeError> {
    value.as_str().ok_or(NormalizeError::InvalidInputType { found: value_kind(value) })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shared default instance with the built-in abbreviation table.
pub fn default_normalizer() -> &'static Normalizer {
    &DEFAULT_NORMALIZER
}

/// Normalize with the default dictionaries.
pub fn prepare_text(text: &str, options: &NormalizeOptions) -> Vec<String> {
    DEFAULT_NORMALIZER.prepare(text, options)
}

pub fn clean_text(text: &str, remove_numbers: bool) -> String {
    clean(text, remove_numbers)
}
