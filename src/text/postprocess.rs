/// Output cleanup of resolved originals.

use super::{HYPHEN_META, PLUS_META};

const BRACKET_PAIRS: &[(char, char)] = &[('(', ')'), ('{', '}'), ('[', ']')];

/// Punctuation that may not start or end a printed description.
const EDGE_PUNCTUATION: &[char] = &[',', ';', '.', ':', '-'];

/// Remove open-ended bracket fragments: a tail starting at an unclosed opening bracket,
/// a head ending at an unopened closing bracket. Repeated until stable.
pub fn remove_unmatched_brackets(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let before = current.clone();
        for &(open, close) in BRACKET_PAIRS {
            current = cut_open_tail(&current, open, close);
        }
        if current == before {
            break;
        }
    }
    loop {
        let before = current.clone();
        for &(open, close) in BRACKET_PAIRS {
            current = cut_close_head(&current, open, close);
        }
        if current == before {
            break;
        }
    }
    current
}

fn cut_open_tail(line: &str, open: char, close: char) -> String {
    match (line.rfind(open), line.rfind(close)) {
        (Some(o), Some(c)) if o > c => line[..o].trim().to_string(),
        (Some(o), None) => line[..o].trim().to_string(),
        _ => line.to_string(),
    }
}

fn cut_close_head(line: &str, open: char, close: char) -> String {
    let first_open = line.find(open).unwrap_or(line.len());
    match line.find(close) {
        Some(c) if c < first_open => line[c + close.len_utf8()..].trim().to_string(),
        _ => line.to_string(),
    }
}

/// Turn meta markers back into `-` and `+`.
pub fn restore(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            HYPHEN_META => '-',
            PLUS_META => '+',
            other => other,
        })
        .collect()
}

/// Strip leading and trailing `, ; . : -` until none remain.
pub fn strip_punctuation(line: &str) -> String {
    let mut current = line.trim();
    loop {
        let before = current;
        if let Some(rest) = current.strip_prefix(EDGE_PUNCTUATION) {
            current = rest.trim();
        }
        if let Some(rest) = current.strip_suffix(EDGE_PUNCTUATION) {
            current = rest.trim();
        }
        if current == before {
            break;
        }
    }
    current.to_string()
}

/// A comma or semicolon within the first three characters marks a torn-off fragment.
pub fn is_mangled(line: &str) -> bool {
    line.chars().take(3).any(|c| c == ',' || c == ';')
}

/// Full output cleanup: brackets, meta markers, edge punctuation.
pub fn clean_output(line: &str) -> String {
    let unbracketed = remove_unmatched_brackets(line);
    let restored = restore(&unbracketed);
    strip_punctuation(&restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::preprocess::protect;

    #[test]
    fn test_remove_open_tail() {
        assert_eq!(remove_unmatched_brackets("kinase (putative"), "kinase");
        assert_eq!(remove_unmatched_brackets("kinase (a) [b"), "kinase (a)");
        assert_eq!(remove_unmatched_brackets("kinase (a) (b"), "kinase (a)");
    }

    #[test]
    fn test_remove_close_head() {
        assert_eq!(remove_unmatched_brackets("subunit) kinase"), "kinase");
        assert_eq!(remove_unmatched_brackets("a] b} kinase"), "kinase");
    }

    #[test]
    fn test_balanced_brackets_are_kept() {
        assert_eq!(
            remove_unmatched_brackets("ATP synthase (subunit a) [EC 3.6]"),
            "ATP synthase (subunit a) [EC 3.6]"
        );
    }

    #[test]
    fn test_strip_punctuation_iterates() {
        assert_eq!(strip_punctuation(" ; , kinase domain. :"), "kinase domain");
        assert_eq!(strip_punctuation("-kinase-"), "kinase");
        assert_eq!(strip_punctuation("..."), "");
    }

    #[test]
    fn test_is_mangled() {
        assert!(is_mangled("a, kinase"));
        assert!(is_mangled("ab; kinase"));
        assert!(!is_mangled("kinase, putative"));
    }

    #[test]
    fn test_meta_round_trip() {
        let protected = protect("ATP-dependent Na+ pump");
        assert_ne!(protected, "ATP-dependent Na+ pump");
        assert_eq!(restore(&protected), "ATP-dependent Na+ pump");
    }

    #[test]
    fn test_protected_hyphen_survives_edge_stripping() {
        assert_eq!(clean_output(&protect("ATP-dependent helicase;")), "ATP-dependent helicase");
    }
}
