//! Input sanitization for settings form fields.

use std::sync::OnceLock;

use regex::Regex;

/// Plain text: tags stripped, whitespace runs collapsed, trimmed.
pub fn sanitize_text_field(input: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();

    let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]*>?").unwrap());
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());

    let stripped = tags.replace_all(input, "");
    spaces.replace_all(&stripped, " ").trim().to_string()
}

/// An http(s) URL, or empty when the input is not one.
///
/// Whitespace and control characters are removed. Input without a scheme
/// gets `http://` prepended; any scheme other than http and https is
/// rejected.
pub fn sanitize_url(input: &str) -> String {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    let scheme_re = SCHEME.get_or_init(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):(.?)").unwrap());

    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    if cleaned.is_empty() {
        return cleaned;
    }

    match scheme_re.captures(&cleaned) {
        Some(caps) => {
            let scheme = caps[1].to_ascii_lowercase();
            let after = &caps[2];
            if scheme == "http" || scheme == "https" {
                cleaned
            } else if after.chars().all(|c| c.is_ascii_digit()) && !after.is_empty() {
                // host:port
                format!("http://{}", cleaned)
            } else {
                String::new()
            }
        }
        None => format!("http://{}", cleaned),
    }
}

/// Attribute-safe text: HTML special characters escaped.
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
