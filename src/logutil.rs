//! Log sanitation for raw chat lines. Inbound text is attacker-adjacent:
//! newlines would split a log record and control characters would garble the
//! terminal, so everything logged verbatim goes through here first.

/// Default preview cap, enough for any command plus a generous to-do text.
const MAX_PREVIEW: usize = 160;

/// Render a chat line safe for a single log record, truncated to the default
/// preview cap.
pub fn escape_log(line: &str) -> String {
    preview(line, MAX_PREVIEW)
}

/// Escape with an explicit character cap. Control characters become `\u{..}`
/// escapes (with the usual short forms for `\n`, `\r`, `\t`), backslashes are
/// doubled so escaped output is unambiguous, and anything past the cap is
/// replaced by an ellipsis.
pub fn preview(line: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(line.len().min(max_chars) + 8);
    for (seen, ch) in line.chars().enumerate() {
        if seen >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(out, "\\u{{{:04X}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{escape_log, preview};

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape_log("a\nb\tc"), "a\\nb\\tc");
        assert_eq!(escape_log("bell\x07"), "bell\\u{0007}");
        // Command prefix survives as a visible double backslash.
        assert_eq!(escape_log("\\addhouse u 1 1 1m"), "\\\\addhouse u 1 1 1m");
    }

    #[test]
    fn caps_the_preview() {
        assert_eq!(preview("abcdefgh", 4), "abcd…");
        let long = "x".repeat(500);
        let escaped = escape_log(&long);
        assert!(escaped.ends_with('…'));
        assert!(escaped.chars().count() <= 161);
    }
}
