//! Shared utility helpers.

/// Truncate a string to `max` bytes (on a char boundary), appending `…`
/// if trimmed.
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_untouched() {
        assert_eq!(truncate_str("abc", 10), "abc");
    }

    #[test]
    fn cuts_on_char_boundary() {
        assert_eq!(truncate_str("héllo", 2), "h…");
        assert_eq!(truncate_str("hello", 3), "hel…");
    }
}
