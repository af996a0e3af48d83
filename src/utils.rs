//! Small string helpers shared by the pipeline and the CLI.
//!
//! - [`truncate_for_log`]: keeps page bodies and long URLs out of log lines
//! - [`parse_key_value`]: clap value parser for repeated `--query-var k=v`

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Split a `key=value` argument. The value may itself contain `=`.
///
/// # Arguments
///
/// * `raw` - The argument as typed, e.g. `ceid=US:en`
///
/// # Returns
///
/// The trimmed key and the untouched value, or a message for clap when the
/// `=` or the key is missing.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got {raw:?}")),
    }
}
