//! String helpers for status messages.

/// Truncate to at most `max_len` bytes, appending `...` when cut.
///
/// Cuts on a UTF-8 character boundary so the result is always valid.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
