//! Sequence-backed reference formatting.
//!
//! Budget applications get their identity from a named per-organization
//! counter; this module renders a counter value into the reference string
//! stored on the record (e.g. `BA/00042`).

/// Formats a sequence value as a reference string.
///
/// The value is zero-padded to `padding` digits after the prefix. A value
/// wider than the padding is rendered in full, never truncated.
#[must_use]
pub fn format(prefix: &str, padding: u32, value: i64) -> String {
    let width = usize::try_from(padding).unwrap_or(0);
    format!("{prefix}{value:0width$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_width() {
        assert_eq!(format("BA/", 5, 1), "BA/00001");
        assert_eq!(format("BA/", 5, 42), "BA/00042");
        assert_eq!(format("REQ-", 3, 7), "REQ-007");
    }

    #[test]
    fn test_format_never_truncates() {
        assert_eq!(format("BA/", 3, 12345), "BA/12345");
        assert_eq!(format("", 0, 9), "9");
    }

    #[test]
    fn test_format_empty_prefix() {
        assert_eq!(format("", 4, 12), "0012");
    }
}
