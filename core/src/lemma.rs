//! Part-of-speech aware lemmatization.
//!
//! Tokens are first tagged with a coarse [`PartOfSpeech`] by a lexicon and
//! suffix tagger, then reduced to a base form: irregular forms come from
//! exception tables, regular inflections are detached by suffix rules and the
//! remaining stem is repaired (consonant undoubling, silent `e`) so that
//! `running`, `created` and `bigger` land on `run`, `create` and `big`.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Coarse word class used to pick the lemmatization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartOfSpeech {
    Adjective,
    Verb,
    #[default]
    Noun,
    Adverb,
}

impl PartOfSpeech {
    /// Map a Penn Treebank tag by its first letter. Anything unrecognised is a
    /// noun.
    pub fn from_penn(tag: &str) -> Self {
        match tag.chars().next() {
            Some('J') => PartOfSpeech::Adjective,
            Some('V') => PartOfSpeech::Verb,
            Some('N') => PartOfSpeech::Noun,
            Some('R') => PartOfSpeech::Adverb,
            _ => PartOfSpeech::Noun,
        }
    }
}

const IRREGULAR_VERBS: &[(&str, &str)] = &[
    ("am", "be"), ("is", "be"), ("are", "be"), ("was", "be"), ("were", "be"), ("been", "be"), ("being", "be"),
    ("has", "have"), ("had", "have"), ("having", "have"),
    ("does", "do"), ("did", "do"), ("done", "do"), ("doing", "do"),
    ("goes", "go"), ("went", "go"), ("gone", "go"), ("going", "go"),
    ("made", "make"), ("said", "say"), ("says", "say"), ("got", "get"), ("gotten", "get"),
    ("took", "take"), ("taken", "take"), ("saw", "see"), ("seen", "see"), ("came", "come"),
    ("knew", "know"), ("known", "know"), ("thought", "think"), ("found", "find"),
    ("gave", "give"), ("given", "give"), ("told", "tell"), ("became", "become"),
    ("left", "leave"), ("felt", "feel"), ("brought", "bring"), ("began", "begin"), ("begun", "begin"),
    ("kept", "keep"), ("held", "hold"), ("wrote", "write"), ("written", "write"), ("stood", "stand"),
    ("heard", "hear"), ("meant", "mean"), ("met", "meet"), ("ran", "run"), ("paid", "pay"),
    ("sat", "sit"), ("spoke", "speak"), ("spoken", "speak"), ("led", "lead"), ("grew", "grow"),
    ("grown", "grow"), ("lost", "lose"), ("fell", "fall"), ("fallen", "fall"), ("sent", "send"),
    ("built", "build"), ("understood", "understand"), ("drew", "draw"), ("drawn", "draw"),
    ("broke", "break"), ("broken", "break"), ("spent", "spend"), ("won", "win"), ("taught", "teach"),
    ("sold", "sell"), ("bought", "buy"), ("caught", "catch"), ("chose", "choose"), ("chosen", "choose"),
    ("ate", "eat"), ("eaten", "eat"), ("drove", "drive"), ("driven", "drive"), ("flew", "fly"),
    ("flown", "fly"), ("forgot", "forget"), ("forgotten", "forget"), ("hid", "hide"), ("hidden", "hide"),
    ("risen", "rise"), ("shook", "shake"), ("shaken", "shake"), ("threw", "throw"), ("thrown", "throw"),
    ("wore", "wear"), ("worn", "wear"), ("sought", "seek"), ("fought", "fight"), ("slept", "sleep"),
    ("swept", "sweep"), ("fed", "feed"), ("bled", "bleed"), ("bred", "breed"), ("sped", "speed"),
    ("fled", "flee"), ("dealt", "deal"), ("dug", "dig"), ("hung", "hang"), ("lent", "lend"),
    ("bent", "bend"), ("bit", "bite"), ("bitten", "bite"), ("blew", "blow"), ("blown", "blow"),
    ("froze", "freeze"), ("frozen", "freeze"), ("stole", "steal"), ("stolen", "steal"), ("swam", "swim"),
    ("swum", "swim"), ("sang", "sing"), ("sung", "sing"), ("rang", "ring"), ("rung", "ring"),
    ("sank", "sink"), ("sunk", "sink"), ("drank", "drink"), ("drunk", "drink"), ("woke", "wake"),
    ("woken", "wake"), ("tore", "tear"), ("torn", "tear"), ("swore", "swear"), ("sworn", "swear"),
    ("shot", "shoot"), ("lit", "light"), ("laid", "lay"), ("lain", "lie"), ("dying", "die"),
    ("lying", "lie"), ("tying", "tie"), ("beaten", "beat"), ("forgave", "forgive"), ("forgiven", "forgive"),
    ("withdrew", "withdraw"), ("withdrawn", "withdraw"), ("overcame", "overcome"), ("undertook", "undertake"),
    ("undertaken", "undertake"), ("mistook", "mistake"), ("mistaken", "mistake"),
    ("misunderstood", "misunderstand"), ("rebuilt", "rebuild"), ("rewrote", "rewrite"),
    ("rewritten", "rewrite"), ("overrode", "override"), ("overridden", "override"), ("upheld", "uphold"),
    ("withheld", "withhold"), ("slid", "slide"), ("struck", "strike"), ("stuck", "stick"),
    ("stung", "sting"), ("swung", "swing"), ("clung", "cling"), ("rode", "ride"), ("ridden", "ride"),
    ("wove", "weave"), ("woven", "weave"), ("shone", "shine"), ("spun", "spin"), ("sprang", "spring"),
    ("sprung", "spring"), ("crept", "creep"), ("wept", "weep"), ("knelt", "kneel"), ("leapt", "leap"),
    ("learnt", "learn"), ("burnt", "burn"), ("dreamt", "dream"), ("spelt", "spell"), ("spilt", "spill"),
    ("smelt", "smell"), ("cancelled", "cancel"), ("cancelling", "cancel"), ("travelled", "travel"),
    ("travelling", "travel"), ("labelled", "label"), ("modelled", "model"), ("levelled", "level"),
    ("signalled", "signal"), ("controlled", "control"), ("controlling", "control"),
    ("enrolled", "enroll"), ("compelled", "compel"), ("expelled", "expel"), ("excelled", "excel"),
];

const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"), ("men", "man"), ("women", "woman"), ("mice", "mouse"), ("feet", "foot"),
    ("teeth", "tooth"), ("geese", "goose"), ("oxen", "ox"), ("lives", "life"), ("wives", "wife"),
    ("knives", "knife"), ("leaves", "leaf"), ("halves", "half"), ("wolves", "wolf"), ("shelves", "shelf"),
    ("thieves", "thief"), ("selves", "self"), ("calves", "calf"), ("loaves", "loaf"),
    ("analyses", "analysis"), ("crises", "crisis"), ("theses", "thesis"), ("criteria", "criterion"),
    ("phenomena", "phenomenon"), ("indices", "index"), ("matrices", "matrix"), ("vertices", "vertex"),
    ("appendices", "appendix"), ("cacti", "cactus"), ("fungi", "fungus"), ("stimuli", "stimulus"),
    ("syllabi", "syllabus"), ("alumni", "alumnus"), ("radii", "radius"), ("caches", "cache"),
    ("niches", "niche"), ("headaches", "headache"), ("movies", "movie"), ("cookies", "cookie"),
    ("calories", "calorie"), ("zombies", "zombie"), ("selfies", "selfie"), ("rookies", "rookie"),
    ("newbies", "newbie"), ("freebies", "freebie"), ("goalies", "goalie"), ("brownies", "brownie"),
    ("ties", "tie"), ("lies", "lie"), ("pies", "pie"), ("excuses", "excuse"), ("abuses", "abuse"),
    ("buses", "bus"), ("statuses", "status"), ("bonuses", "bonus"), ("viruses", "virus"),
    ("campuses", "campus"), ("censuses", "census"), ("focuses", "focus"), ("biases", "bias"),
    ("aliases", "alias"), ("canvases", "canvas"), ("atlases", "atlas"), ("gases", "gas"),
    ("lenses", "lens"), ("salesmen", "salesman"), ("chairmen", "chairman"),
    ("businessmen", "businessman"), ("sportsmen", "sportsman"), ("gentlemen", "gentleman"),
];

const IRREGULAR_ADJECTIVES: &[(&str, &str)] = &[
    ("better", "good"), ("best", "good"), ("worse", "bad"), ("worst", "bad"), ("further", "far"),
    ("furthest", "far"), ("farther", "far"), ("farthest", "far"), ("less", "little"),
    ("least", "little"), ("elder", "old"), ("eldest", "old"),
];

/// Nouns the suffix tagger would otherwise misread, and nouns ending in `s`
/// that are already base forms.
const NOUN_LEXICON: &[&str] = &[
    "morning", "evening", "thing", "nothing", "something", "anything", "everything", "string",
    "king", "ring", "spring", "wing", "ceiling", "wedding", "meeting", "building", "family",
    "supply", "assembly", "july", "italy", "anomaly", "monopoly", "rally", "ally", "hundred",
    "bed", "shed", "news", "series", "species", "means", "lens", "bias", "canvas", "alias",
    "atlas", "gas", "bus", "yes", "analysis", "basis", "crisis", "thesis", "axis", "business",
    "process", "access", "address", "class", "loss", "boss", "success", "progress", "status",
    "bonus", "campus", "virus", "focus", "census", "consensus", "corpus", "plus", "minus",
    "data", "media", "criteria", "analytics", "statistics", "economics", "mathematics",
    "physics", "politics", "ethics", "logistics", "electronics", "graphics", "odds", "winnings",
    "earnings", "savings", "headquarters", "excuse", "abuse", "user", "player", "customer",
    "casino", "game", "sport", "account", "time", "group", "company", "team", "engine",
    "setting", "listing", "rating", "ranking", "booking", "pricing", "marketing", "training",
    "warning", "opening", "beginning", "ending", "offering", "heading", "funding", "betting",
    "wagering", "gambling", "streaming",
];

const VERB_LEXICON: &[&str] = &[
    "be", "have", "do", "go", "get", "make", "know", "think", "take", "see", "come", "want",
    "look", "use", "find", "give", "tell", "work", "call", "try", "ask", "need", "feel",
    "become", "leave", "put", "mean", "keep", "let", "begin", "seem", "help", "talk", "turn",
    "start", "show", "hear", "play", "run", "move", "like", "live", "believe", "hold", "bring",
    "happen", "write", "provide", "sit", "stand", "lose", "pay", "meet", "include", "continue",
    "set", "learn", "change", "lead", "understand", "watch", "follow", "stop", "create", "speak",
    "read", "allow", "add", "spend", "grow", "open", "walk", "win", "offer", "remember", "love",
    "consider", "appear", "buy", "wait", "serve", "die", "send", "expect", "build", "stay",
    "fall", "cut", "reach", "remain", "suggest", "raise", "pass", "sell", "require", "report",
    "decide", "pull", "improve", "measure", "calculate", "track", "manage", "apply", "deposit",
    "withdraw", "register", "verify", "contact", "reset", "join", "define", "explain",
    "describe", "recommend", "support", "contain", "update", "complete", "delete", "compete",
    "quote", "promote", "devote", "invite", "unite", "excite", "ignore", "explore", "restore",
    "adore", "proceed", "succeed", "exceed", "bleed", "breed", "feed", "seed", "heed", "speed",
    "visit", "limit", "edit", "target", "market", "budget", "benefit", "credit", "exhibit",
    "inherit", "profit", "audit", "submit", "listen", "enter", "order", "answer", "filter",
    "monitor", "sponsor", "label", "cancel", "travel", "model", "control", "level", "signal",
    "enroll", "subscribe", "prescribe", "browse", "guide", "challenge", "range", "plunge",
    "revenge", "postpone", "rename", "overcome", "welcome", "escape", "upgrade", "downgrade",
    "persuade", "invade", "evade", "develop", "gamble", "bet", "log", "sign", "login", "wager",
    "spin", "claim", "redeem", "transfer", "refer", "prefer", "occur", "recur", "incur",
    "deter", "commit", "permit", "omit", "emit", "admit", "regret", "forget", "quit", "hit",
    "fit", "split", "compel", "expel", "excel",
];

const ADJECTIVE_LEXICON: &[&str] = &[
    "good", "bad", "new", "old", "high", "low", "big", "small", "great", "large", "long", "short",
    "late", "early", "easy", "hard", "fast", "slow", "nice", "safe", "simple", "strong", "weak",
    "young", "wide", "deep", "cheap", "rich", "poor", "true", "false", "free", "full", "real",
    "main", "average", "total", "different", "important", "available", "possible", "popular",
    "current", "specific", "similar", "common", "public", "private", "active", "responsible",
    "daily", "weekly", "monthly", "yearly", "annual", "several", "many", "much", "last", "next",
    "first", "second", "third", "able", "ready", "sure", "happy", "whole", "recent", "clear",
    "fair", "mobile", "social", "digital", "global", "local", "internal", "external", "minimum",
    "maximum", "legal", "illegal", "valid", "invalid", "due", "quick", "tall", "hot", "cold",
    "warm", "cool", "dark", "light", "heavy", "busy", "lucky", "funny", "pretty", "tiny", "huge",
    "wise", "proud", "fine", "rare", "wild", "honest", "modest",
];

const ADVERB_LEXICON: &[&str] = &[
    "also", "often", "always", "never", "soon", "still", "already", "ever", "yet", "quite",
    "rather", "perhaps", "together", "away", "back", "instead", "however", "therefore",
    "sometimes", "usually", "later", "today", "tomorrow", "yesterday", "almost", "even", "well",
    "maybe", "else", "anyway", "otherwise", "afterwards", "abroad", "ahead", "apart", "indeed",
    "nonetheless", "nevertheless", "meanwhile", "very", "too", "again", "here", "there", "now",
    "then", "only", "just",
];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "our", "their", "his",
    "her", "its", "some", "any", "each", "every", "no", "of", "in", "for", "on", "with",
];

const VERB_CUES: &[&str] = &[
    "to", "will", "would", "can", "could", "should", "must", "may", "might", "shall", "do",
    "does", "did", "not", "please",
];

const ADJECTIVE_SUFFIXES: &[&str] = &["ous", "ful", "ive", "able", "ible", "al", "ic", "less", "ish"];

/// Stem endings that take a silent `e` back after `-ed` / `-ing` removal.
const SILENT_E_ENDINGS: &[&str] = &[
    "bl", "pl", "dl", "tl", "gl", "kl", "zl", "fl", "cl", "rg", "dg", "uir", "ns", "rs", "ls", "ps",
];

fn is_vowel_at(chars: &[char], i: usize) -> bool {
    match chars[i] {
        'a' | 'e' | 'i' | 'o' | 'u' => true,
        'y' => i > 0 && !is_vowel_at(chars, i - 1),
        _ => false,
    }
}

fn has_vowel(word: &str) -> bool {
    let chars: Vec<char> = word.chars().collect();
    (0..chars.len()).any(|i| is_vowel_at(&chars, i))
}

fn vowel_groups(chars: &[char]) -> usize {
    let mut groups = 0;
    let mut in_group = false;
    for i in 0..chars.len() {
        let v = is_vowel_at(chars, i);
        if v && !in_group {
            groups += 1;
        }
        in_group = v;
    }
    groups
}

/// Consonant-vowel-consonant ending, last consonant not `w`, `x` or `y`.
fn ends_cvc(chars: &[char]) -> bool {
    let n = chars.len();
    n >= 3
        && !is_vowel_at(chars, n - 3)
        && is_vowel_at(chars, n - 2)
        && !is_vowel_at(chars, n - 1)
        && !matches!(chars[n - 1], 'w' | 'x' | 'y')
}

fn needs_silent_e(stem: &str) -> bool {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n < 2 {
        return false;
    }
    if n == 2 {
        return is_vowel_at(&chars, 0) && !is_vowel_at(&chars, 1) && !matches!(chars[1], 'w' | 'x' | 'y');
    }
    let last = chars[n - 1];
    let prev_vowel = is_vowel_at(&chars, n - 2);
    let consonant_before_vowel = !is_vowel_at(&chars, n - 3) && prev_vowel;
    let groups = vowel_groups(&chars);

    if matches!(last, 'v' | 'c' | 'u') {
        return true;
    }
    if SILENT_E_ENDINGS.iter().any(|e| stem.ends_with(e)) {
        return true;
    }
    if stem.ends_with("at") && consonant_before_vowel {
        return true;
    }
    if (stem.ends_with("hang") || stem.ends_with("rang")) && n > 4 {
        return true;
    }
    if prev_vowel && matches!(last, 's' | 'z') {
        return true;
    }
    if consonant_before_vowel {
        match (chars[n - 2], last) {
            ('a' | 'i' | 'u', 'r') | ('a' | 'i' | 'o' | 'u', 'd') | ('a' | 'i' | 'o', 'k') => return true,
            ('a' | 'e' | 'i' | 'o' | 'u', 'g') => return true,
            ('i' | 'u', 'n' | 'l' | 'm') | ('u', 't') if groups >= 2 => return true,
            _ => {}
        }
    }
    groups == 1 && ends_cvc(&chars)
}

/// Reduces tagged tokens to dictionary base forms.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<PartOfSpeech, HashMap<&'static str, &'static str>>,
    lexicon: HashMap<&'static str, PartOfSpeech>,
    base_forms: HashSet<&'static str>,
    adjectives: HashSet<&'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    pub fn new() -> Self {
        let mut exceptions: HashMap<PartOfSpeech, HashMap<&'static str, &'static str>> = HashMap::new();
        exceptions.insert(PartOfSpeech::Verb, IRREGULAR_VERBS.iter().copied().collect());
        exceptions.insert(PartOfSpeech::Noun, IRREGULAR_NOUNS.iter().copied().collect());
        exceptions.insert(PartOfSpeech::Adjective, IRREGULAR_ADJECTIVES.iter().copied().collect());

        let mut lexicon = HashMap::new();
        for (words, pos) in [
            (ADVERB_LEXICON, PartOfSpeech::Adverb),
            (ADJECTIVE_LEXICON, PartOfSpeech::Adjective),
            (VERB_LEXICON, PartOfSpeech::Verb),
            (NOUN_LEXICON, PartOfSpeech::Noun),
        ] {
            for w in words {
                lexicon.insert(*w, pos);
            }
        }

        let base_forms = NOUN_LEXICON
            .iter()
            .chain(VERB_LEXICON)
            .chain(ADJECTIVE_LEXICON)
            .copied()
            .collect();

        Self {
            exceptions,
            lexicon,
            base_forms,
            adjectives: ADJECTIVE_LEXICON.iter().copied().collect(),
        }
    }

    fn exception(&self, word: &str, pos: PartOfSpeech) -> Option<&'static str> {
        self.exceptions.get(&pos).and_then(|m| m.get(word)).copied()
    }

    /// Tag each token. Tags are chosen from the word itself and then adjusted
    /// by the immediately preceding token.
    pub fn tag(&self, tokens: &[String]) -> Vec<PartOfSpeech> {
        let mut tags: Vec<PartOfSpeech> = tokens.iter().map(|t| self.tag_word(&t.to_lowercase())).collect();
        for i in 1..tokens.len() {
            let prev = tokens[i - 1].to_lowercase();
            let word = &tokens[i];
            if VERB_CUES.contains(&prev.as_str())
                && tags[i] == PartOfSpeech::Noun
                && !word.ends_with('s')
                && !NOUN_LEXICON.contains(&word.as_str())
            {
                tags[i] = PartOfSpeech::Verb;
            } else if DETERMINERS.contains(&prev.as_str()) && tags[i] == PartOfSpeech::Verb {
                tags[i] = if word.ends_with("ed") { PartOfSpeech::Adjective } else { PartOfSpeech::Noun };
            }
        }
        tags
    }

    fn tag_word(&self, word: &str) -> PartOfSpeech {
        if word.chars().any(|c| c.is_ascii_digit()) {
            return PartOfSpeech::Noun;
        }
        if let Some(pos) = self.lexicon.get(word) {
            return *pos;
        }
        for pos in [PartOfSpeech::Verb, PartOfSpeech::Adjective, PartOfSpeech::Noun] {
            if self.exception(word, pos).is_some() {
                return pos;
            }
        }
        let n = word.len();
        if n > 4 && word.ends_with("ly") {
            return PartOfSpeech::Adverb;
        }
        if n > 4 && word.ends_with("ing") && has_vowel(&word[..n - 3]) {
            return PartOfSpeech::Verb;
        }
        if n > 3 && word.ends_with("ed") {
            return PartOfSpeech::Verb;
        }
        if ((n > 5 && word.ends_with("est")) || (n > 4 && word.ends_with("er")))
            && self.adjectives.contains(self.adjective(word).as_str())
        {
            return PartOfSpeech::Adjective;
        }
        if n > 4 && ADJECTIVE_SUFFIXES.iter().any(|s| word.ends_with(s)) {
            return PartOfSpeech::Adjective;
        }
        PartOfSpeech::Noun
    }

    /// Base form of `word` read as `pos`. Anything but lowercase ASCII
    /// letters, or words shorter than three letters, come back unchanged.
    pub fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String {
        if word.len() < 3 || !word.chars().all(|c| c.is_ascii_lowercase()) {
            return word.to_string();
        }
        if let Some(base) = self.exception(word, pos) {
            return base.to_string();
        }
        if self.base_forms.contains(word) {
            return word.to_string();
        }
        match pos {
            PartOfSpeech::Noun => self.noun(word),
            PartOfSpeech::Verb => self.verb(word),
            PartOfSpeech::Adjective => self.adjective(word),
            PartOfSpeech::Adverb => word.to_string(),
        }
    }

    /// Tag then lemmatize, keeping token order.
    pub fn lemmatize_tokens(&self, tokens: &[String]) -> Vec<String> {
        let tags = self.tag(tokens);
        tokens
            .iter()
            .zip(tags)
            .map(|(token, pos)| self.lemmatize(token, pos))
            .collect()
    }

    fn noun(&self, word: &str) -> String {
        let n = word.len();
        if n <= 3 || !word.ends_with('s') || word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if word.ends_with("ies") {
            return if n > 4 { format!("{}y", &word[..n - 3]) } else { word[..n - 1].to_string() };
        }
        if ["sses", "xes", "zzes", "ches", "shes"].iter().any(|s| word.ends_with(s)) {
            return word[..n - 2].to_string();
        }
        if word.ends_with("oes") && n > 5 {
            return word[..n - 2].to_string();
        }
        word[..n - 1].to_string()
    }

    fn verb(&self, word: &str) -> String {
        let n = word.len();
        if word.ends_with('s') {
            if n <= 3 || word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
                return word.to_string();
            }
            if word.ends_with("ies") {
                return if n > 4 { format!("{}y", &word[..n - 3]) } else { word[..n - 1].to_string() };
            }
            if ["sses", "shes", "ches", "xes", "zzes", "oes"].iter().any(|s| word.ends_with(s)) {
                return word[..n - 2].to_string();
            }
            return word[..n - 1].to_string();
        }
        if n >= 5 && word.ends_with("ing") {
            let stem = &word[..n - 3];
            if has_vowel(stem) {
                return self.restore_stem(stem);
            }
            return word.to_string();
        }
        if n >= 4 && word.ends_with("ed") {
            if word.ends_with("ied") {
                return if n > 4 { format!("{}y", &word[..n - 3]) } else { word[..n - 1].to_string() };
            }
            if word.ends_with("eed") {
                return word[..n - 1].to_string();
            }
            let stem = &word[..n - 2];
            if has_vowel(stem) {
                return self.restore_stem(stem);
            }
        }
        word.to_string()
    }

    fn adjective(&self, word: &str) -> String {
        let n = word.len();
        if n > 5 && word.ends_with("iest") {
            return format!("{}y", &word[..n - 4]);
        }
        if n > 4 && word.ends_with("ier") {
            return format!("{}y", &word[..n - 3]);
        }
        if n > 5 && word.ends_with("est") {
            return self.restore_stem(&word[..n - 3]);
        }
        if n > 4 && word.ends_with("er") {
            return self.restore_stem(&word[..n - 2]);
        }
        word.to_string()
    }

    /// Repair a stem left after detaching `-ed`, `-ing`, `-er` or `-est`.
    fn restore_stem(&self, stem: &str) -> String {
        if self.base_forms.contains(stem) {
            return stem.to_string();
        }
        let with_e = format!("{stem}e");
        if self.base_forms.contains(with_e.as_str()) {
            return with_e;
        }
        if stem.ends_with('e') {
            return stem.to_string();
        }
        let chars: Vec<char> = stem.chars().collect();
        let n = chars.len();
        if n >= 4 && chars[n - 1] == chars[n - 2] && !is_vowel_at(&chars, n - 1) {
            let undoubled = &stem[..n - 1];
            if self.base_forms.contains(undoubled) || !matches!(chars[n - 1], 'l' | 's' | 'f' | 'z') {
                return undoubled.to_string();
            }
            return stem.to_string();
        }
        if needs_silent_e(stem) {
            return with_e;
        }
        stem.to_string()
    }
}
