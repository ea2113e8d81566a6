//! JSON decoding with readable failure messages.

use anyhow::Result;

/// Parse JSON and, on failure, report the serde path, a cleaned-up type
/// mismatch and a snippet of the offending input.
pub fn parse_json_with_context<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let jd = &mut serde_json::Deserializer::from_str(body);
    match serde_path_to_error::deserialize(jd) {
        Ok(value) => Ok(value),
        Err(err) => {
            let inner_err = err.inner();
            let (line, column) = (inner_err.line(), inner_err.column());
            let path = err.path().to_string();

            let msg = inner_err.to_string();
            let loc = format!(" at line {line} column {column}");
            let msg_without_loc = msg.strip_suffix(&loc).unwrap_or(&msg);

            let mut final_err = String::new();
            if !path.is_empty() && path != "." {
                final_err.push_str(&format!("at path '{path}': "));
            }
            final_err.push_str(&format!(
                "{} (col {column}) near `{}`",
                parse_type_mismatch(msg_without_loc),
                snippet(body, line, column, 24)
            ));

            Err(anyhow::anyhow!(final_err))
        }
    }
}

/// Rewrite `"invalid type: X, expected Y"` as `"expected Y, got X"`.
fn parse_type_mismatch(error_msg: &str) -> String {
    if let Some(rest) = error_msg.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {}, got {}", expected.trim(), actual);
    }
    error_msg.to_string()
}

fn snippet(body: &str, line: usize, column: usize, context_len: usize) -> String {
    let target_line = body.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let chars: Vec<char> = target_line.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    let error_idx = column.saturating_sub(1).min(chars.len());
    let half_len = context_len / 2;
    let start = error_idx.saturating_sub(half_len);
    let end = (error_idx + half_len).min(chars.len());

    chars[start..end].iter().collect()
}
