use crate::error::NormalizeError;
use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;

/// Compiled-size ceiling for a dictionary alternation.
pub const DEFAULT_PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Domain abbreviations expanded before tokenization.
pub const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("gig", "gaming innovation group"),
    ("sql", "structured query language"),
    ("kpi", "key performance indicator"),
    ("kpis", "key performance indicators"),
    ("gre", "game recommendation engine"),
    ("rtp", "return to player"),
    ("atpu", "average time per user"),
];

const CONTRACTIONS: &[(&str, &str)] = &[
    ("ain't", "are not"),
    ("aren't", "are not"),
    ("can't", "cannot"),
    ("can't've", "cannot have"),
    ("could've", "could have"),
    ("couldn't", "could not"),
    ("couldn't've", "could not have"),
    ("didn't", "did not"),
    ("doesn't", "does not"),
    ("don't", "do not"),
    ("hadn't", "had not"),
    ("hadn't've", "had not have"),
    ("hasn't", "has not"),
    ("haven't", "have not"),
    ("he'd", "he would"),
    ("he'd've", "he would have"),
    ("he'll", "he will"),
    ("he's", "he is"),
    ("how'd", "how did"),
    ("how'll", "how will"),
    ("how's", "how is"),
    ("i'd", "i would"),
    ("i'd've", "i would have"),
    ("i'll", "i will"),
    ("i'm", "i am"),
    ("i've", "i have"),
    ("isn't", "is not"),
    ("it'd", "it would"),
    ("it'll", "it will"),
    ("it's", "it is"),
    ("let's", "let us"),
    ("ma'am", "madam"),
    ("mightn't", "might not"),
    ("might've", "might have"),
    ("mustn't", "must not"),
    ("must've", "must have"),
    ("needn't", "need not"),
    ("o'clock", "of the clock"),
    ("shan't", "shall not"),
    ("she'd", "she would"),
    ("she'll", "she will"),
    ("she's", "she is"),
    ("should've", "should have"),
    ("shouldn't", "should not"),
    ("that'd", "that would"),
    ("that's", "that is"),
    ("there'd", "there would"),
    ("there's", "there is"),
    ("they'd", "they would"),
    ("they'll", "they will"),
    ("they're", "they are"),
    ("they've", "they have"),
    ("wasn't", "was not"),
    ("we'd", "we would"),
    ("we'll", "we will"),
    ("we're", "we are"),
    ("we've", "we have"),
    ("weren't", "were not"),
    ("what'll", "what will"),
    ("what're", "what are"),
    ("what's", "what is"),
    ("what've", "what have"),
    ("when's", "when is"),
    ("where'd", "where did"),
    ("where's", "where is"),
    ("where've", "where have"),
    ("who'll", "who will"),
    ("who's", "who is"),
    ("who've", "who have"),
    ("why's", "why is"),
    ("won't", "will not"),
    ("would've", "would have"),
    ("wouldn't", "would not"),
    ("y'all", "you all"),
    ("you'd", "you would"),
    ("you'll", "you will"),
    ("you're", "you are"),
    ("you've", "you have"),
];

const SLANG: &[(&str, &str)] = &[
    ("gonna", "going to"),
    ("gotta", "got to"),
    ("wanna", "want to"),
    ("gimme", "give me"),
    ("lemme", "let me"),
    ("kinda", "kind of"),
    ("sorta", "sort of"),
    ("outta", "out of"),
];

/// Apostrophe-less spellings that are ordinary English words; these are only
/// expanded when written with the apostrophe.
const AMBIGUOUS_BARE: &[&str] = &[
    "its", "ill", "well", "were", "id", "hell", "shell", "wed", "shed", "lets",
];

/// Build a single whole-word alternation over `keys`, longest first, matched
/// case-insensitively. `None` when there are no keys.
fn whole_word_pattern<'a>(
    keys: impl Iterator<Item = &'a str>,
    size_limit: usize,
) -> Result<Option<Regex>, regex::Error> {
    let mut keys: Vec<&str> = keys.collect();
    if keys.is_empty() {
        return Ok(None);
    }
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    let alternation = keys.iter().map(|k| regex::escape(k)).collect::<Vec<_>>().join("|");
    RegexBuilder::new(&format!(r"(?i)\b(?:{alternation})\b"))
        .size_limit(size_limit)
        .build()
        .map(Some)
}

/// Case-insensitive whole-word dictionary replacement, applied in one pass.
///
/// Replacements are never rescanned, so an expansion cannot itself be
/// expanded again. Word boundaries on both sides mean a shorter key can never
/// match inside a longer word (`kpi` does not fire on `kpis`).
#[derive(Debug, Clone)]
pub struct AbbreviationMap {
    entries: HashMap<String, String>,
    pattern: Option<Regex>,
}

impl AbbreviationMap {
    /// Compile a custom table. Fails when the alternation is too large to
    /// compile, rather than silently expanding nothing.
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Result<Self, NormalizeError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::with_size_limit(entries, DEFAULT_PATTERN_SIZE_LIMIT)
    }

    pub fn with_size_limit<K, V>(
        entries: impl IntoIterator<Item = (K, V)>,
        size_limit: usize,
    ) -> Result<Self, NormalizeError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: HashMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into().to_lowercase(), v.into()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        let pattern = whole_word_pattern(entries.keys().map(String::as_str), size_limit)
            .map_err(|source| NormalizeError::Dictionary { entries: entries.len(), source })?;
        Ok(Self { entries, pattern })
    }

    pub fn expand(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        pattern
            .replace_all(text, |caps: &Captures| {
                let matched = &caps[0];
                self.entries
                    .get(&matched.to_lowercase())
                    .cloned()
                    .unwrap_or_else(|| matched.to_string())
            })
            .into_owned()
    }
}

impl Default for AbbreviationMap {
    fn default() -> Self {
        Self::new(DEFAULT_ABBREVIATIONS.iter().copied()).expect("built-in abbreviation table compiles")
    }
}

/// English contraction expander.
#[derive(Debug, Clone)]
pub struct ContractionMap {
    entries: HashMap<String, &'static str>,
    pattern: Option<Regex>,
}

impl ContractionMap {
    pub fn new() -> Self {
        let mut entries: HashMap<String, &'static str> = HashMap::new();
        for &(short, long) in CONTRACTIONS.iter().chain(SLANG) {
            entries.insert(short.to_string(), long);
            let bare = short.replace('\'', "");
            if bare != short && !AMBIGUOUS_BARE.contains(&bare.as_str()) {
                entries.entry(bare).or_insert(long);
            }
        }
        let pattern = whole_word_pattern(entries.keys().map(String::as_str), DEFAULT_PATTERN_SIZE_LIMIT)
            .expect("built-in contraction table compiles");
        Self { entries, pattern }
    }

    pub fn expand(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };
        let text = text.replace('\u{2019}', "'");
        pattern
            .replace_all(&text, |caps: &Captures| {
                let matched = &caps[0];
                match self.entries.get(&matched.to_lowercase()) {
                    Some(long) => match_case(matched, long),
                    None => matched.to_string(),
                }
            })
            .into_owned()
    }
}

impl Default for ContractionMap {
    fn default() -> Self {
        Self::new()
    }
}

fn match_case(original: &str, expansion: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return expansion.to_uppercase();
    }
    match original.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = expansion.chars();
            match chars.next() {
                Some(head) => head.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => expansion.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_whole_words_only() {
        let abbr = AbbreviationMap::default();
        assert_eq!(abbr.expand("gig kpis"), "gaming innovation group key performance indicators");
        assert_eq!(abbr.expand("the kpi"), "the key performance indicator");
        // Inside a larger word nothing fires.
        assert_eq!(abbr.expand("gigantic mysql"), "gigantic mysql");
    }

    #[test]
    fn abbreviations_match_case_insensitively() {
        let abbr = AbbreviationMap::default();
        assert_eq!(abbr.expand("GiG RTP"), "gaming innovation group return to player");
    }

    #[test]
    fn expansions_are_not_rescanned() {
        let abbr = AbbreviationMap::new([("a", "b a"), ("b", "c")]).unwrap();
        assert_eq!(abbr.expand("a b"), "b a c");
    }

    #[test]
    fn empty_map_is_identity() {
        let abbr = AbbreviationMap::new(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(abbr.expand("gig"), "gig");
    }

    #[test]
    fn oversized_tables_are_reported() {
        let err = AbbreviationMap::with_size_limit([("gig", "gaming innovation group")], 1).unwrap_err();
        assert!(matches!(err, NormalizeError::Dictionary { entries: 1, .. }));

        let many: Vec<(String, String)> = (0..50).map(|i| (format!("abbr{i}"), format!("expansion {i}"))).collect();
        let abbr = AbbreviationMap::new(many).unwrap();
        assert_eq!(abbr.expand("ABBR7 and abbr42"), "expansion 7 and expansion 42");
    }

    #[test]
    fn expands_contractions_with_and_without_apostrophe() {
        let c = ContractionMap::new();
        assert_eq!(c.expand("don't stop"), "do not stop");
        assert_eq!(c.expand("dont stop"), "do not stop");
        assert_eq!(c.expand("I'm here"), "I am here");
        assert_eq!(c.expand("you\u{2019}re late"), "you are late");
        assert_eq!(c.expand("WON'T"), "WILL NOT");
    }

    #[test]
    fn leaves_ordinary_words_alone() {
        let c = ContractionMap::new();
        assert_eq!(c.expand("its well were ill"), "its well were ill");
        assert_eq!(c.expand("it's"), "it is");
    }
}
