/// Text handling for descriptions
///
/// - `canonical`: canonical token forms and the reverse lookup to presentable originals
/// - `preprocess`: input cleanup before canonicalization
///   (organism tags, meta labels, +/- protection)
/// - `postprocess`: output cleanup of resolved originals
/// - `stem`: pluggable token stemming

pub mod canonical;
pub mod postprocess;
pub mod preprocess;
pub mod stem;

/// Label every generic description collapses into, and the fallback output text.
pub const UNKNOWN_LABEL: &str = "conserved unknown protein";

/// Meta markers standing in for characters that must survive tokenization untouched.
/// Private-use code points: never delimiters, never cased, never in real annotations.
pub const HYPHEN_META: char = '\u{E000}';
pub const PLUS_META: char = '\u{E001}';

const GENERIC_EXACT: &[&str] = &[
    "protein",
    "unknown",
    "unknown protein",
    "unnamed protein",
    "family protein",
    "unnamed protein product",
];

const GENERIC_CONTAINED: &[&str] = &[
    "hypothetical protein",
    "predicted protein",
    UNKNOWN_LABEL,
];

/// Whether a description carries no functional information.
pub fn is_generic(input: &str) -> bool {
    let lower = input.trim().to_lowercase();
    GENERIC_EXACT.iter().any(|g| lower == *g)
        || GENERIC_CONTAINED.iter().any(|g| lower.contains(g))
}

/// Replace a generic description by `UNKNOWN_LABEL`, leave anything else as-is.
pub fn unify_generic(input: &str) -> &str {
    if is_generic(input) {
        UNKNOWN_LABEL
    } else {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_exact_markers() {
        assert!(is_generic("Unknown"));
        assert!(is_generic("  protein "));
        assert!(is_generic("unnamed protein product"));
        assert!(!is_generic("kinase protein"));
        assert!(!is_generic("unknown kinase"));
    }

    #[test]
    fn test_generic_contained_markers() {
        assert!(is_generic("conserved hypothetical protein"));
        assert!(is_generic("Predicted protein, partial"));
        assert!(is_generic("Conserved unknown protein"));
    }

    #[test]
    fn test_unify_generic_keeps_informative_text() {
        assert_eq!(unify_generic("hypothetical protein T23"), UNKNOWN_LABEL);
        assert_eq!(unify_generic("ABC transporter"), "ABC transporter");
    }
}
