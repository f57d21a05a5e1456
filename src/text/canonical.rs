/// Canonical token forms and the reverse lookup to presentable originals.
///
/// Descriptions are matched and counted in canonical form: delimiter-free tokens,
/// optionally stemmed and lowercased, optionally in sorted order. Every canonical
/// form remembers one original string to print, chosen deterministically among all
/// originals that produced it. The lookup is query-scoped: call `clean()` between
/// independent queries.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::config::MiningConfig;
use super::stem::{IdentityStemmer, PorterStemmer, Stemmer};
use super::unify_generic;

/// Characters that separate tokens.
const WORD_DELIMITERS: &[char] = &[
    '.', ',', ';', ':', '/', '|', '[', ']', '{', '}', '(', ')', '?', '!', '\'', '&', '*', '=',
    ' ', '\t',
];

/// Characters that may not end a sub-phrase.
const END_REMOVALS: &[char] = &[
    '.', ',', ';', ':', '/', '-', '|', '_', '[', '{', '(', '+', '?', '!', '\'', '&', '*', '=',
    ' ', '\t',
];

/// Characters that may not start a sub-phrase. Opening brackets stay: their partner may follow.
const LEADING_REMOVALS: &[char] = &[
    '.', ',', ';', ':', '/', '-', '|', '_', '+', '?', '!', '\'', '&', '*', '=', ' ', '\t',
];

/// Characters only meaningful in the middle of a word.
const INTERMEDIATE_PUNCTUATION: &[char] = &['_'];

fn is_delimiter(c: char) -> bool {
    WORD_DELIMITERS.contains(&c)
}

/// Split a line into raw tokens on the word delimiter set.
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    line.split(is_delimiter).filter(|t| !t.is_empty())
}

/// Sorted, de-duplicated token bag joined by single spaces.
pub fn sorted_tokens<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut bag: Vec<&str> = tokens.into_iter().collect();
    bag.sort_unstable();
    bag.dedup();
    bag.join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalOptions {
    pub lowercase: bool,
    pub stemming: bool,
    pub unify_unknowns: bool,
    pub strip_end_punctuation: bool,
    pub sort_subphrase_tokens: bool,
}

impl Default for CanonicalOptions {
    fn default() -> Self {
        CanonicalOptions {
            lowercase: true,
            stemming: true,
            unify_unknowns: true,
            strip_end_punctuation: true,
            sort_subphrase_tokens: false,
        }
    }
}

impl From<&MiningConfig> for CanonicalOptions {
    fn from(m: &MiningConfig) -> Self {
        CanonicalOptions {
            lowercase: m.lowercase,
            stemming: m.stemming,
            unify_unknowns: m.unify_unknowns,
            strip_end_punctuation: m.strip_end_punctuation,
            sort_subphrase_tokens: m.sort_subphrase_tokens,
        }
    }
}

/// Canonicalizer plus the canonical → original index.
pub struct TextMapping {
    originals: HashMap<String, String>,
    options: CanonicalOptions,
    stemmer: Box<dyn Stemmer>,
}

impl TextMapping {
    /// Mapping with the default stemmer for the given options.
    pub fn new(options: CanonicalOptions) -> Self {
        let stemmer: Box<dyn Stemmer> = if options.stemming {
            Box::new(PorterStemmer)
        } else {
            Box::new(IdentityStemmer)
        };
        Self::with_stemmer(options, stemmer)
    }

    pub fn with_stemmer(options: CanonicalOptions, stemmer: Box<dyn Stemmer>) -> Self {
        TextMapping {
            originals: HashMap::new(),
            options,
            stemmer,
        }
    }

    /// Drop every registered mapping.
    pub fn clean(&mut self) {
        self.originals = HashMap::new();
    }

    pub fn len(&self) -> usize {
        self.originals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }

    /// Best original string registered for a canonical form.
    pub fn retrieve_original(&self, canonical: &str) -> Option<&str> {
        self.originals.get(canonical).map(String::as_str)
    }

    /// Canonical tokens of a line: folded, split, stemmed, lowercased.
    fn canonical_tokens(&self, line: &str) -> Vec<String> {
        let folded = fold_intermediate(line);
        tokenize(&folded)
            .map(|token| {
                let token = if self.options.stemming {
                    self.stemmer.stem(token)
                } else {
                    token.to_string()
                };
                if self.options.lowercase {
                    token.to_lowercase()
                } else {
                    token
                }
            })
            .collect()
    }

    /// Canonical key of a line, without registering anything.
    pub fn canonicalize(&self, line: &str, allow_reordering: bool) -> String {
        let tokens = self.canonical_tokens(line);
        if allow_reordering {
            sorted_tokens(tokens.iter().map(String::as_str))
        } else {
            tokens.join(" ")
        }
    }

    /// Canonicalize a line and register it (and optionally all its sub-phrases).
    ///
    /// The registration key follows `allow_reordering`; the returned string always
    /// keeps the original token order, which is what the language models train on.
    pub fn convert(
        &mut self,
        line: &str,
        expand_subphrases: bool,
        allow_reordering: bool,
    ) -> String {
        let tokens = self.canonical_tokens(line);
        let key = if allow_reordering {
            sorted_tokens(tokens.iter().map(String::as_str))
        } else {
            tokens.join(" ")
        };
        self.register(line, key);
        if expand_subphrases {
            self.register_subphrases(line, allow_reordering);
        }
        tokens.join(" ")
    }

    fn register(&mut self, line: &str, key: String) {
        if key.is_empty() {
            return;
        }
        let original = if self.options.unify_unknowns {
            unify_generic(line)
        } else {
            line
        };
        match self.originals.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(original.to_string());
            }
            Entry::Occupied(mut slot) => {
                let winner = choose(slot.get(), original);
                if winner != slot.get() {
                    let winner = winner.to_string();
                    slot.insert(winner);
                }
            }
        }
    }

    /// Register every contiguous run of words of the line.
    ///
    /// Words keep their trailing delimiters so a sub-phrase reads like the text it
    /// was cut from ("ABC transporter, ATP-binding" yields "transporter, ATP-binding").
    /// With `sort_subphrase_tokens` a run is also registered under its sorted key,
    /// still pointing at the unsorted text. Reordering already sorts every key.
    fn register_subphrases(&mut self, line: &str, allow_reordering: bool) {
        let folded = fold_intermediate(line);
        let words = delimited_words(&folded);
        let total = words.len();
        for width in 1..=total {
            for start in 0..=(total - width) {
                let joined = words[start..start + width].concat();
                let mut candidate = joined.trim();
                if self.options.strip_end_punctuation {
                    candidate = candidate
                        .trim_end_matches(|c: char| END_REMOVALS.contains(&c))
                        .trim_start_matches(|c: char| LEADING_REMOVALS.contains(&c));
                }
                if candidate.is_empty() {
                    continue;
                }
                self.convert(candidate, false, allow_reordering);
                if self.options.sort_subphrase_tokens && !allow_reordering {
                    let tokens = self.canonical_tokens(candidate);
                    let key = sorted_tokens(tokens.iter().map(String::as_str));
                    self.register(candidate, key);
                }
            }
        }
    }
}

/// Collapse mid-word-only punctuation next to a space ("word_ word") into the space.
fn fold_intermediate(line: &str) -> String {
    let mut folded = line.to_string();
    for punct in INTERMEDIATE_PUNCTUATION {
        folded = folded
            .replace(&format!("{} ", punct), " ")
            .replace(&format!(" {}", punct), " ");
    }
    folded
}

/// Split a line into words, each word carrying the delimiters that follow it.
fn delimited_words(line: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut previous_was_delimiter = false;
    for (idx, c) in line.char_indices() {
        let delimiter = is_delimiter(c);
        if !delimiter && previous_was_delimiter && idx > start {
            words.push(&line[start..idx]);
            start = idx;
        }
        previous_was_delimiter = delimiter;
    }
    if start < line.len() {
        words.push(&line[start..]);
    }
    words
}

fn count_char(s: &str, c: char) -> usize {
    s.chars().filter(|&x| x == c).count()
}

/// Balanced pair counts, and not wrapped entirely in one redundant pair.
fn balanced_unwrapped(s: &str, open: char, close: char) -> bool {
    count_char(s, open) == count_char(s, close) && !(s.starts_with(open) && s.ends_with(close))
}

fn balanced(s: &str, open: char, close: char) -> bool {
    count_char(s, open) == count_char(s, close)
}

/// Pick the more presentable of two originals for the same canonical form.
///
/// Precedence: regular casing over all-uppercase, regular casing over all-lowercase,
/// balanced `()`, balanced `[]`, shorter, lexicographically smaller. The result does not
/// depend on argument order.
pub fn choose<'a>(a: &'a str, b: &'a str) -> &'a str {
    let a_upper = a.to_uppercase() == a;
    let b_upper = b.to_uppercase() == b;
    if a_upper != b_upper {
        return if a_upper { b } else { a };
    }

    let a_lower = a.to_lowercase() == a;
    let b_lower = b.to_lowercase() == b;
    if a_lower != b_lower {
        return if a_lower { b } else { a };
    }

    for (open, close) in [('(', ')'), ('[', ']')] {
        let a_ok = balanced_unwrapped(a, open, close);
        let b_ok = balanced_unwrapped(b, open, close);
        if a_ok && !balanced(b, open, close) {
            return a;
        }
        if b_ok && !balanced(a, open, close) {
            return b;
        }
    }

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len != b_len {
        return if a_len < b_len { a } else { b };
    }
    if b < a {
        b
    } else {
        a
    }
}
