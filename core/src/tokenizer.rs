use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("valid regex");

    /// Penn Treebank rewrite rules, applied in order to a single sentence.
    static ref RULES: Vec<(Regex, &'static str)> = {
        let rules: &[(&str, &str)] = &[
            // starting quotes
            (r#"^""#, "``"),
            (r"(``)", " $1 "),
            (r#"([ (\[{<])""#, "$1 `` "),
            // punctuation
            (r#"([^.])(\.)([\])}>"']*)\s*$"#, "$1 $2 $3 "),
            (r"([:,])([^\d])", " $1 $2"),
            (r"([:,])$", " $1 "),
            (r"\.{2,}", " $0 "),
            (r"[;@#$%&*]", " $0 "),
            (r"[?!]", " $0 "),
            (r"([^'])' ", "$1 ' "),
            // brackets
            (r"[\]\[(){}<>]", " $0 "),
            (r"--", " -- "),
            // ending quotes
            (r#"""#, " '' "),
            (r"(\S)('')", "$1 $2 "),
            (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "$1 $2 "),
            (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "$1 $2 "),
            // fused forms
            (r"(?i)\b(can)(not)\b", " $1 $2 "),
            (r"(?i)\b(d)('ye)\b", " $1 $2 "),
            (r"(?i)\b(gim)(me)\b", " $1 $2 "),
            (r"(?i)\b(gon)(na)\b", " $1 $2 "),
            (r"(?i)\b(got)(ta)\b", " $1 $2 "),
            (r"(?i)\b(lem)(me)\b", " $1 $2 "),
            (r"(?i)\b(more)('n)\b", " $1 $2 "),
            (r"(?i)\b(wan)(na)\b", " $1 $2 "),
            (r"(?i) ('t)(is)\b", " $1 $2 "),
            (r"(?i) ('t)(was)\b", " $1 $2 "),
        ];
        rules
            .iter()
            .map(|(pat, rep)| (Regex::new(pat).expect("valid regex"), *rep))
            .collect()
    };
}

/// Split text into sentences at terminal punctuation followed by whitespace,
/// unless the next sentence would start with a lowercase letter.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END.find_iter(text) {
        let next = text[m.end()..].chars().next();
        if matches!(next, Some(c) if c.is_lowercase()) {
            continue;
        }
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Treebank tokenization of a single sentence.
pub fn tokenize_sentence(sentence: &str) -> Vec<String> {
    let mut text = format!(" {sentence} ");
    for (re, rep) in RULES.iter() {
        text = re.replace_all(&text, *rep).into_owned();
    }
    text.split_whitespace().map(str::to_string).collect()
}

/// Word tokenization: punctuation, brackets, quotes and clitics become
/// separate tokens; order follows the input.
pub fn word_tokenize(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .flat_map(tokenize_sentence)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_punctuation_and_clitics() {
        let toks = word_tokenize("Hello, world! Don't stop.");
        assert_eq!(toks, vec!["Hello", ",", "world", "!", "Do", "n't", "stop", "."]);
    }

    #[test]
    fn splits_fused_forms() {
        assert_eq!(word_tokenize("i cannot go"), vec!["i", "can", "not", "go"]);
        assert_eq!(word_tokenize("gonna win"), vec!["gon", "na", "win"]);
    }

    #[test]
    fn plain_words_split_on_spaces() {
        assert_eq!(word_tokenize("key performance  indicators"), vec!["key", "performance", "indicators"]);
        assert!(word_tokenize("   ").is_empty());
    }

    #[test]
    fn keeps_decimal_numbers_together() {
        assert_eq!(word_tokenize("rtp is 96,5 (approx)"), vec!["rtp", "is", "96,5", "(", "approx", ")"]);
    }
}
