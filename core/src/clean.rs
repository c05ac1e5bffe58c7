use deunicode::deunicode_char;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Whitespace removed during cleaning. The plain space is kept.
const STRIPPED_WHITESPACE: [char; 5] = ['\t', '\n', '\r', '\x0b', '\x0c'];

/// Fold text to its closest plain-ASCII spelling.
///
/// Compatibility decomposition splits accented letters into base letter plus
/// combining marks, which are then dropped. Whatever is still outside ASCII
/// is transliterated (`Привет` to `Privet`, `€` to `EUR`); characters with no
/// known spelling are removed.
pub fn fold_to_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkd() {
        if c.is_ascii() {
            out.push(c);
        } else if is_combining_mark(c) {
            continue;
        } else if let Some(repl) = deunicode_char(c) {
            out.push_str(repl);
        }
    }
    out
}

/// Fold to ASCII, lowercase, and strip punctuation plus every whitespace
/// character except the single space. Digits are stripped only when
/// `remove_numbers` is set. Leading and trailing spaces are trimmed; inner
/// runs of spaces are left as they are.
pub fn clean(text: &str, remove_numbers: bool) -> String {
    let folded = fold_to_ascii(text);
    let cleaned: String = folded
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| {
            !(c.is_ascii_punctuation()
                || STRIPPED_WHITESPACE.contains(c)
                || (remove_numbers && c.is_ascii_digit()))
        })
        .collect();
    cleaned.trim_matches(' ').to_string()
}
