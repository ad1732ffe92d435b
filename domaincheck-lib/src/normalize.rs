//! Input normalization.
//!
//! Turns freeform user text into a [`DomainIdentifier`] or rejects it.
//! Everything downstream (including the WHOIS subprocess) only ever sees
//! names that passed through here.

use crate::error::DomainCheckError;
use crate::types::DomainIdentifier;
use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

lazy_static! {
    /// Dot-separated segments of `[a-z0-9-]`, first character alphanumeric.
    /// Rules out leading hyphens along with empty, leading, trailing and
    /// doubled dots.
    static ref DOMAIN_STRUCTURE: Regex =
        Regex::new(r"^[a-z0-9][a-z0-9-]*(\.[a-z0-9-]+)+$").expect("domain pattern is valid");
}

const DEFAULT_TLD: &str = "com";

/// Normalize a single user-supplied domain.
///
/// Trims and lowercases the input and appends `.com` only when it contains
/// no dot at all, so names like `example.org` keep their TLD.
///
/// # Errors
///
/// * `EmptyInput` if nothing is left after trimming
/// * `InvalidFormat` if the name ends with a dot, starts with a hyphen, or
///   contains anything outside letters, digits, hyphens and dots
///
/// # Example
///
/// ```rust
/// use domaincheck_lib::normalize;
///
/// let id = normalize("  TruCore ").unwrap();
/// assert_eq!(id.full(), "trucore.com");
///
/// let id = normalize("example.org").unwrap();
/// assert_eq!(id.tld(), "org");
/// ```
pub fn normalize(input: &str) -> Result<DomainIdentifier, DomainCheckError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainCheckError::EmptyInput);
    }

    let mut full = trimmed.to_lowercase();
    if !full.contains('.') {
        full.push('.');
        full.push_str(DEFAULT_TLD);
    }

    if full.ends_with('.') || !DOMAIN_STRUCTURE.is_match(&full) {
        return Err(DomainCheckError::invalid_format(trimmed));
    }

    let (label, tld) = match full.rsplit_once('.') {
        Some((label, tld)) if !label.is_empty() && !tld.is_empty() => {
            (label.to_string(), tld.to_string())
        }
        _ => return Err(DomainCheckError::invalid_format(trimmed)),
    };

    Ok(DomainIdentifier::from_parts(full, label, tld))
}

/// Normalize every input independently.
///
/// One result per input, in input order. A failure for one item has no
/// effect on the others.
pub fn normalize_batch<S: AsRef<str>>(inputs: &[S]) -> Vec<Result<DomainIdentifier, DomainCheckError>> {
    inputs.iter().map(|input| normalize(input.as_ref())).collect()
}

impl FromStr for DomainIdentifier {
    type Err = DomainCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_com_without_dot() {
        let cases = [
            ("trucore", "trucore.com"),
            ("  TruCore  ", "trucore.com"),
            ("my-startup", "my-startup.com"),
            ("a1", "a1.com"),
            ("\tx\n", "x.com"),
        ];

        for (input, expected) in cases {
            let id = normalize(input).unwrap();
            assert_eq!(id.full(), expected, "input {:?}", input);
            assert_eq!(id.tld(), "com");
        }
    }

    #[test]
    fn test_preserves_existing_tld() {
        let cases = [
            ("example.org", "example", "org"),
            ("Example.ORG", "example", "org"),
            ("startup.io", "startup", "io"),
            ("foo.co.uk", "foo.co", "uk"),
            ("sub.example.net", "sub.example", "net"),
            ("example.com", "example", "com"),
        ];

        for (input, label, tld) in cases {
            let id = normalize(input).unwrap();
            assert_eq!(id.label(), label, "input {:?}", input);
            assert_eq!(id.tld(), tld, "input {:?}", input);
            assert_eq!(id.full(), format!("{}.{}", label, tld));
            assert!(!id.full().ends_with(".com") || tld == "com");
        }

        assert_eq!(normalize("example.org").unwrap().full(), "example.org");
    }

    #[test]
    fn test_rejects_leading_hyphen() {
        for input in ["-bad.com", "-bad", "  -rf", "--help", "-V"] {
            let err = normalize(input).unwrap_err();
            assert!(
                matches!(err, DomainCheckError::InvalidFormat { .. }),
                "input {:?} gave {:?}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_rejects_empty() {
        for input in ["", "   ", "\t\n"] {
            assert!(matches!(
                normalize(input),
                Err(DomainCheckError::EmptyInput)
            ));
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for input in [
            "example.",
            "example.com.",
            ".com",
            ".example",
            "exa..mple.com",
            "exa mple.com",
            "exa_mple.com",
            "example.com/path",
            "ex@mple.com",
            "例え.jp",
            "bad;rm -rf",
        ] {
            assert!(
                matches!(normalize(input), Err(DomainCheckError::InvalidFormat { .. })),
                "input {:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_idempotent() {
        for input in ["trucore", "Example.ORG", " foo.co.uk ", "my-site", "x1.dev"] {
            let once = normalize(input).unwrap();
            let twice = normalize(once.full()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_batch_keeps_positions() {
        let results = normalize_batch(&["trucore", "", "example.org", "-bad.com"]);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().full(), "trucore.com");
        assert!(matches!(results[1], Err(DomainCheckError::EmptyInput)));
        assert_eq!(results[2].as_ref().unwrap().full(), "example.org");
        assert!(matches!(results[3], Err(DomainCheckError::InvalidFormat { .. })));
    }

    #[test]
    fn test_from_str() {
        let id: DomainIdentifier = "Hello.Dev".parse().unwrap();
        assert_eq!(id.to_string(), "hello.dev");
        assert!("-x".parse::<DomainIdentifier>().is_err());
    }
}
