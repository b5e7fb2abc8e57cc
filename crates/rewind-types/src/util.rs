/// Truncate to at most `max` characters, ellipsizing when cut.
///
/// Operates on characters, not bytes, so multi-byte input never splits a
/// code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
