//! Lenient comparison of Minecraft version strings
//!
//! Game versions are not semver. This comparator tokenizes on separators and
//! digit/letter boundaries, compares numeric tokens numerically and text
//! tokens lexically, and ranks any text token below any numeric one, so
//! classic identifiers such as `rd-132211` sort below every numbered release.
//! The legacy beta notation `b1.6.6` forms its own era: every beta-marked
//! version ranks below every numbered release and above the pre-beta text
//! identifiers, and only within that era is the `b` marker stripped for the
//! token comparison. The resulting order is a deterministic partial order,
//! reflexive by construction.

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(u64),
    Text(String),
}

/// Strip the leading marker from the legacy `bMAJOR.MINOR[.PATCH]` notation
pub fn strip_legacy_beta_marker(version: &str) -> &str {
    match version.strip_prefix('b') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    let flush = |buf: &mut String, is_digit: bool, out: &mut Vec<Token>| {
        if buf.is_empty() {
            return;
        }
        if is_digit {
            // Numeric runs longer than u64 fall back to text tokens
            match buf.parse::<u64>() {
                Ok(n) => out.push(Token::Number(n)),
                Err(_) => out.push(Token::Text(std::mem::take(buf))),
            }
        } else {
            out.push(Token::Text(buf.to_lowercase()));
        }
        buf.clear();
    };

    for c in strip_legacy_beta_marker(version).chars() {
        if c == '.' || c == '-' || c == '_' || c == ' ' {
            flush(&mut current, current_is_digit, &mut tokens);
            continue;
        }

        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit, &mut tokens);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush(&mut current, current_is_digit, &mut tokens);

    tokens
}

fn compare_tokens(a: Option<&Token>, b: Option<&Token>) -> Ordering {
    match (a, b) {
        (Some(Token::Number(x)), Some(Token::Number(y))) => x.cmp(y),
        (Some(Token::Text(x)), Some(Token::Text(y))) => x.cmp(y),
        // Any parseable numeric token outranks any text token
        (Some(Token::Number(_)), Some(Token::Text(_))) => Ordering::Greater,
        (Some(Token::Text(_)), Some(Token::Number(_))) => Ordering::Less,
        // Trailing zeros are insignificant; trailing qualifiers sort below
        (Some(Token::Number(x)), None) => x.cmp(&0),
        (None, Some(Token::Number(y))) => 0.cmp(y),
        (Some(Token::Text(_)), None) => Ordering::Less,
        (None, Some(Token::Text(_))) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// Era ranks: pre-beta text identifiers < legacy betas < numbered releases
fn era(version: &str) -> u8 {
    if strip_legacy_beta_marker(version) != version {
        return 1;
    }
    match version.chars().next() {
        Some(c) if c.is_ascii_digit() => 2,
        _ => 0,
    }
}

/// Compare two version-like strings
pub fn compare(a: &str, b: &str) -> Ordering {
    let ordering = era(a).cmp(&era(b));
    if ordering != Ordering::Equal {
        return ordering;
    }

    let left = tokenize(a);
    let right = tokenize(b);
    let len = left.len().max(right.len());

    for i in 0..len {
        let ordering = compare_tokens(left.get(i), right.get(i));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive() {
        for v in ["1.20", "b1.6.6", "rd-132211", "23w17a", "1.7.10-pre4", ""] {
            assert_eq!(compare(v, v), Ordering::Equal, "compare({v}, {v})");
        }
    }

    #[test]
    fn test_numeric_ordering() {
        assert_eq!(compare("1.19", "1.20"), Ordering::Less);
        assert_eq!(compare("1.20.1", "1.20"), Ordering::Greater);
        assert_eq!(compare("1.8.9", "1.12"), Ordering::Less);
    }

    #[test]
    fn test_legacy_beta_marker_is_stripped() {
        assert_eq!(strip_legacy_beta_marker("b1.6.6"), "1.6.6");
        assert_eq!(strip_legacy_beta_marker("beta"), "beta");
        assert_eq!(strip_legacy_beta_marker("1.20"), "1.20");
    }

    #[test]
    fn test_legacy_beta_comparisons() {
        assert_eq!(compare("b1.5.0", "b1.6.6"), Ordering::Less);
        assert_eq!(compare("b1.7.3", "b1.6.6"), Ordering::Greater);
        assert_eq!(compare("b1.6.6", "b1.6.6"), Ordering::Equal);
        // Modern releases sort above every beta
        assert_eq!(compare("1.20", "b1.6.6"), Ordering::Greater);
    }

    #[test]
    fn test_releases_rank_above_every_legacy_beta() {
        // 1.0 through 1.6.5 postdate beta 1.6.6, their digits notwithstanding
        assert_eq!(compare("1.0", "b1.6.6"), Ordering::Greater);
        assert_eq!(compare("1.5.2", "b1.6.6"), Ordering::Greater);
        assert_eq!(compare("1.6.5", "b1.6.6"), Ordering::Greater);
        assert_eq!(compare("b1.7.3", "1.0"), Ordering::Less);
    }

    #[test]
    fn test_unparseable_sorts_below_parseable() {
        assert_eq!(compare("rd-132211", "1.0"), Ordering::Less);
        assert_eq!(compare("c0.30", "b1.6.6"), Ordering::Less);
        assert_eq!(compare("a1.0.4", "b1.6.6"), Ordering::Less);
    }

    #[test]
    fn test_trailing_zeros_equal() {
        assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_trailing_qualifier_sorts_below() {
        assert_eq!(compare("1.20-rc1", "1.20"), Ordering::Less);
        assert_eq!(compare("1.20", "1.20-pre1"), Ordering::Greater);
    }
}
