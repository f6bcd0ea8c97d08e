//! Utility functions.

/// Parses a hexadecimal address, with or without a `0x`/`0X` prefix.
pub fn parse_hex(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    // from_str_radix accepts a leading '+', which is not a valid address
    if digits.is_empty() || digits.starts_with('+') {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// Parses a plain decimal integer.
pub fn parse_dec(value: &str) -> Option<u64> {
    if value.is_empty() || value.starts_with('+') {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_with_and_without_prefix() {
        assert_eq!(parse_hex("1000"), Some(0x1000));
        assert_eq!(parse_hex("0x1000"), Some(0x1000));
        assert_eq!(parse_hex("0XdeadBEEF"), Some(0xdead_beef));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("0x"), None);
        assert_eq!(parse_hex("+10"), None);
        assert_eq!(parse_hex("xyz"), None);
        assert_eq!(parse_hex("1_000"), None);
        assert_eq!(parse_dec("-1"), None);
        assert_eq!(parse_dec("+1"), None);
        assert_eq!(parse_dec("ten"), None);
        assert_eq!(parse_dec("42"), Some(42));
    }
}
