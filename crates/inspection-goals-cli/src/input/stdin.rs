use serde_json::Value;
use std::io::{self, Read};

/// Command input piped on stdin, e.g. `igoals catch-up < march.json`.
///
/// `None` when stdin is a terminal or carries only whitespace, so callers
/// can fall back to flags.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("Failed to read stdin: {e}"))?;
    tracing::debug!(bytes = buffer.len(), "read command input from stdin");

    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(trimmed).map_err(|e| {
        format!(
            "stdin is not valid JSON (line {}, column {}): {e}; pass --input <file.json> or pipe a JSON object",
            e.line(),
            e.column()
        )
    })?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_means_no_input() {
        assert!(parse_piped("  \n").unwrap().is_none());
    }

    #[test]
    fn test_parse_error_points_at_position() {
        let err = parse_piped("{\n  \"monthly_target\": ,\n}").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
