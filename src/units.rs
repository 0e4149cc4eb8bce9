//! Size column conversion.
//!
//! The catalog prints sizes as a number followed by an SI prefix and a `b`
//! suffix, e.g. `816kb` or `1.5 Mb`. The suffix counts bits, so the byte
//! count is the prefixed value divided by eight.

/// Multiplier of a decimal SI prefix character.
pub fn si_multiplier(prefix: char) -> Option<f64> {
    match prefix {
        'k' | 'K' => Some(1e3),
        'M' => Some(1e6),
        'G' => Some(1e9),
        'T' => Some(1e12),
        _ => None,
    }
}

/// Converts a size cell to a byte count.
///
/// The leading numeral is parsed before the prefix multiplier is applied.
/// Returns `None` for blank cells, a missing numeral, an unknown prefix or a
/// missing `b` suffix.
///
/// ```rust
/// use bookwyrm::units::parse_size;
///
/// assert_eq!(parse_size("816kb"), Some(102_000));
/// assert_eq!(parse_size("2 Mb"), Some(250_000));
/// assert_eq!(parse_size("64b"), Some(8));
/// assert_eq!(parse_size("n/a"), None);
/// ```
pub fn parse_size(text: &str) -> Option<u64> {
    let token: String = text.split_whitespace().collect();
    let numeral_len = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    let (numeral, unit) = token.split_at(numeral_len);

    let value: f64 = numeral.parse().ok()?;

    let mut unit_chars = unit.chars();
    let multiplier = match (unit_chars.next(), unit_chars.next(), unit_chars.next()) {
        (Some('b' | 'B'), None, None) => 1.0,
        (Some(prefix), Some('b' | 'B'), None) => si_multiplier(prefix)?,
        _ => return None,
    };

    Some((value * multiplier / 8.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeral_is_parsed_before_multiplying() {
        // 816 * 1000 / 8, not "816" repeated a thousand times
        assert_eq!(parse_size("816kb"), Some(816 * 1000 / 8));
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(parse_size("8Kb"), Some(1_000));
        assert_eq!(parse_size("8Mb"), Some(1_000_000));
        assert_eq!(parse_size("8Gb"), Some(1_000_000_000));
        assert_eq!(parse_size("8Tb"), Some(1_000_000_000_000));
    }

    #[test]
    fn test_fractional_and_spaced() {
        assert_eq!(parse_size("1.5 Mb"), Some(187_500));
        assert_eq!(parse_size("  12 kb "), Some(1_500));
    }

    #[test]
    fn test_malformed() {
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("kb"), None);
        assert_eq!(parse_size("12"), None);
        assert_eq!(parse_size("12xb"), None);
        assert_eq!(parse_size("12kbit"), None);
        assert_eq!(parse_size("1.2.3kb"), None);
    }
}
