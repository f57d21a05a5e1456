/// Token stemming.
///
/// Stemming is a pluggable capability: the canonicalizer only needs `stem(token)`.
/// `PorterStemmer` is the default. It stems the lowercased token and keeps the
/// original casing of the part that survives, so case folding can run afterwards.

pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;
}

/// Leaves every token unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Porter (1980) suffix stripping.
///
/// Only tokens made of ASCII letters and longer than two characters are stemmed;
/// identifiers such as "tRNA_ligase" or "2A" pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl Stemmer for PorterStemmer {
    fn stem(&self, token: &str) -> String {
        if token.len() <= 2 || !token.bytes().all(|b| b.is_ascii_alphabetic()) {
            return token.to_string();
        }
        let lower = token.to_ascii_lowercase();
        let stemmed = porter(lower.as_bytes());

        // the stem only changes a tail of the word; keep the original casing before it
        let kept = stemmed
            .iter()
            .zip(lower.as_bytes())
            .take_while(|(a, b)| a == b)
            .count();
        let mut out = String::with_capacity(stemmed.len());
        out.push_str(&token[..kept]);
        out.extend(stemmed[kept..].iter().map(|&b| char::from(b)));
        out
    }
}

fn is_consonant(w: &[u8], i: usize) -> bool {
    match w[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(w, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences in `w`: [C](VC){m}[V].
fn measure(w: &[u8]) -> usize {
    let mut m = 0;
    let mut i = 0;
    while i < w.len() && is_consonant(w, i) {
        i += 1;
    }
    while i < w.len() {
        while i < w.len() && !is_consonant(w, i) {
            i += 1;
        }
        if i == w.len() {
            break;
        }
        while i < w.len() && is_consonant(w, i) {
            i += 1;
        }
        m += 1;
    }
    m
}

fn has_vowel(w: &[u8]) -> bool {
    (0..w.len()).any(|i| !is_consonant(w, i))
}

fn ends_double_consonant(w: &[u8]) -> bool {
    let n = w.len();
    n >= 2 && w[n - 1] == w[n - 2] && is_consonant(w, n - 1)
}

/// consonant-vowel-consonant ending, the last consonant not w, x or y.
fn ends_cvc(w: &[u8]) -> bool {
    let n = w.len();
    n >= 3
        && is_consonant(w, n - 3)
        && !is_consonant(w, n - 2)
        && is_consonant(w, n - 1)
        && !matches!(w[n - 1], b'w' | b'x' | b'y')
}

/// Stem length of `w` when it ends with `suffix`.
fn stem_of(w: &[u8], suffix: &str) -> Option<usize> {
    w.ends_with(suffix.as_bytes()).then(|| w.len() - suffix.len())
}

fn replace(w: &mut Vec<u8>, stem: usize, with: &str) {
    w.truncate(stem);
    w.extend_from_slice(with.as_bytes());
}

/// Replace the longest matching suffix of `rules` when its stem measure exceeds `min_measure`.
fn apply_rules(w: &mut Vec<u8>, rules: &[(&str, &str)], min_measure: usize) {
    let matched = rules
        .iter()
        .filter_map(|(suffix, with)| stem_of(w.as_slice(), suffix).map(|stem| (stem, *with)))
        .min_by_key(|(stem, _)| *stem);
    if let Some((stem, with)) = matched {
        if measure(&w[..stem]) > min_measure {
            replace(w, stem, with);
        }
    }
}

const STEP2: &[(&str, &str)] = &[
    ("ational", "ate"), ("tional", "tion"), ("enci", "ence"), ("anci", "ance"),
    ("izer", "ize"), ("bli", "ble"), ("alli", "al"), ("entli", "ent"), ("eli", "e"),
    ("ousli", "ous"), ("ization", "ize"), ("ation", "ate"), ("ator", "ate"),
    ("alism", "al"), ("iveness", "ive"), ("fulness", "ful"), ("ousness", "ous"),
    ("aliti", "al"), ("iviti", "ive"), ("biliti", "ble"), ("logi", "log"),
];

const STEP3: &[(&str, &str)] = &[
    ("icate", "ic"), ("ative", ""), ("alize", "al"), ("iciti", "ic"), ("ical", "ic"),
    ("ful", ""), ("ness", ""),
];

const STEP4: &[&str] = &[
    "al", "ance", "ence", "er", "ic", "able", "ible", "ant", "ement", "ment", "ent", "ion",
    "ou", "ism", "ate", "iti", "ous", "ive", "ize",
];

fn porter(word: &[u8]) -> Vec<u8> {
    let mut w = word.to_vec();

    // 1a: plurals
    if let Some(stem) = stem_of(&w, "sses") {
        replace(&mut w, stem, "ss");
    } else if let Some(stem) = stem_of(&w, "ies") {
        replace(&mut w, stem, "i");
    } else if !w.ends_with(b"ss") && w.ends_with(b"s") {
        w.pop();
    }

    // 1b: -ed / -ing
    if let Some(stem) = stem_of(&w, "eed") {
        if measure(&w[..stem]) > 0 {
            replace(&mut w, stem, "ee");
        }
    } else if let Some(stem) = stem_of(&w, "ed").or_else(|| stem_of(&w, "ing")) {
        if has_vowel(&w[..stem]) {
            w.truncate(stem);
            if w.ends_with(b"at") || w.ends_with(b"bl") || w.ends_with(b"iz") {
                w.push(b'e');
            } else if ends_double_consonant(&w) && !matches!(w[w.len() - 1], b'l' | b's' | b'z') {
                w.pop();
            } else if measure(&w) == 1 && ends_cvc(&w) {
                w.push(b'e');
            }
        }
    }

    // 1c: terminal y
    if let Some(stem) = stem_of(&w, "y") {
        if has_vowel(&w[..stem]) {
            replace(&mut w, stem, "i");
        }
    }

    apply_rules(&mut w, STEP2, 0);
    apply_rules(&mut w, STEP3, 0);

    // 4: strip suffixes from long stems
    let matched = STEP4
        .iter()
        .filter_map(|suffix| stem_of(&w, suffix))
        .min();
    if let Some(stem) = matched {
        let keeps_ion = !w[stem..].starts_with(b"ion")
            || (stem > 0 && matches!(w[stem - 1], b's' | b't'));
        if keeps_ion && measure(&w[..stem]) > 1 {
            w.truncate(stem);
        }
    }

    // 5a: final e
    if let Some(stem) = stem_of(&w, "e") {
        let m = measure(&w[..stem]);
        if m > 1 || (m == 1 && !ends_cvc(&w[..stem])) {
            w.truncate(stem);
        }
    }

    // 5b: -ll
    if measure(&w) > 1 && ends_double_consonant(&w) && w.ends_with(b"l") {
        w.pop();
    }

    w
}
