//! Helpers for codecs that encode payloads as `word int int ...`.

/// The first blank-delimited word of `text` (all of it if there is no blank).
pub fn parse_command(text: &str) -> &str {
    text.trim().split(' ').next().unwrap_or_default()
}

/// The integers following the command word, in order.
///
/// Stops at the first token that is not an integer; everything after it
/// is ignored.
pub fn parse_args(text: &str) -> Vec<i32> {
    text.trim()
        .split(' ')
        .skip(1)
        .map_while(|tok| tok.parse().ok())
        .collect()
}
