//! Log-safe rendering of content ids, titles and icons.
//!
//! Ids and titles arrive from content files and callers, so they may carry
//! newlines or control characters that would split a log record.

/// Characters kept from one value before it is cut with an ellipsis.
const MAX_PREVIEW: usize = 120;

/// Render `s` on one line: `\n`, `\r`, `\t` and backslash are escaped, other
/// control characters become `\u{..}`, and long values are truncated.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW));
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_PREVIEW) {
        push_escaped(&mut out, ch);
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => out.extend(c.escape_unicode()),
        c => out.push(c),
    }
}

/// `icon title` for unlock and banner log lines. A blank icon is dropped.
pub fn achievement_label(icon: &str, title: &str) -> String {
    let icon = icon.trim();
    if icon.is_empty() {
        escape_log(title)
    } else {
        format!("{} {}", escape_log(icon), escape_log(title))
    }
}
