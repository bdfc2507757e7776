/// Bullet glyph substituted for a leading "- " in assistant replies
pub const BULLET: &str = "•";

/// Escape HTML special characters so text renders literally.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape, then apply the light reply formatting: one `<br>` per newline and a
/// bullet glyph for lines starting with "- ".
///
/// The only markup in the output is the `<br>` this function inserts itself.
pub fn format_message(text: &str) -> String {
    escape_html(text)
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            match line.strip_prefix("- ") {
                Some(rest) => format!("{} {}", BULLET, rest),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

/// Plain-text counterpart of [`format_message`] for terminal output.
pub fn format_plain(text: &str) -> String {
    text.lines()
        .map(|line| match line.strip_prefix("- ") {
            Some(rest) => format!("{} {}", BULLET, rest),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
