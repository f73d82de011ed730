//! Script-injection guards for free-text fields.
//!
//! Three independent tools with different jobs:
//! - [`detect_xss`] rejects suspicious input at the point of entry,
//! - [`sanitize_html`] removes markup from rich content before rendering,
//! - [`escape_html`] entity-escapes plain text for interpolation into markup.
//!
//! They are not interchangeable: escaping keeps every character (as an
//! entity), sanitizing removes tags, detection only answers yes or no.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static XSS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)<\s*script\b",
        r"(?i)javascript\s*:",
        r"(?i)vbscript\s*:",
        // inline event handlers inside a tag: <img onerror=, <body onload =
        r#"(?i)<[^>]*[\s"'/]on[a-z]{3,}\s*="#,
        // attribute breakout: " onmouseover=
        r#"(?i)["'][\s/]+on[a-z]{3,}\s*="#,
        r"(?i)expression\s*\(",
        r"(?i)data\s*:\s*text/html",
        r"(?i)<\s*(?:iframe|object|embed)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("xss signature compiles"))
    .collect()
});

/// Inline formatting tags kept by [`sanitize_html`] when tags are allowed.
pub const ALLOWED_TAGS: &[&str] = &["b", "i", "em", "strong", "u", "br"];

/// Elements whose content is dropped together with the tags.
const DROPPED_ELEMENTS: &[&str] = &["script", "style"];

/// Whether the input matches any known script-injection signature.
///
/// ```
/// use storefront_forms::detect_xss;
///
/// assert!(detect_xss(r#"<img src=x onerror="alert(1)">"#));
/// assert!(!detect_xss("Hello world"));
/// ```
pub fn detect_xss(input: &str) -> bool {
    XSS_PATTERNS.iter().any(|pattern| pattern.is_match(input))
}

/// Entity-escape `& < > " ' / ` =` for safe interpolation into markup.
///
/// Nothing is removed; tags survive as visible text.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            other => out.push(other),
        }
    }
    out
}

/// Byte offset of the `>` closing a tag that starts at `tag[0] == '<'`,
/// skipping `>` characters inside quoted attribute values.
fn tag_end(tag: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in tag.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

fn looks_like_tag(after_lt: &str) -> bool {
    let mut chars = after_lt.chars();
    match chars.next() {
        Some('/') => chars.next().is_some_and(|c| c.is_ascii_alphabetic()),
        Some('!') => true,
        Some(c) => c.is_ascii_alphabetic(),
        None => false,
    }
}

/// Remove markup from `input`.
///
/// With `allow_tags == false` only the text content remains. With
/// `allow_tags == true` the [`ALLOWED_TAGS`] survive, stripped of all
/// attributes. Disallowed tags are removed, not escaped, and their text is
/// kept, except for `script` and `style` whose content goes with them.
///
/// ```
/// use storefront_forms::sanitize_html;
///
/// assert_eq!(sanitize_html("<b>hi</b>", false), "hi");
/// assert_eq!(sanitize_html(r#"<b class="x">hi</b><script>x()</script>"#, true), "<b>hi</b>");
/// ```
pub fn sanitize_html(input: &str, allow_tags: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tag = &rest[start..];

        if !looks_like_tag(&tag[1..]) {
            out.push('<');
            rest = &tag[1..];
            continue;
        }

        if tag.starts_with("<!--") {
            rest = tag.find("-->").map_or("", |end| &tag[end + 3..]);
            continue;
        }

        let Some(end) = tag_end(tag) else {
            // unterminated tag swallows the remainder
            rest = "";
            break;
        };

        let inner = &tag[1..end];
        let closing = inner.starts_with('/');
        let name: String = inner
            .trim_start_matches('/')
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        rest = &tag[end + 1..];

        if !closing && DROPPED_ELEMENTS.contains(&name.as_str()) {
            let lowered = rest.to_ascii_lowercase();
            rest = match lowered.find(&format!("</{name}")) {
                Some(close) => {
                    let close_tag = &rest[close..];
                    tag_end(close_tag).map_or("", |end| &close_tag[end + 1..])
                }
                None => "",
            };
            continue;
        }

        if allow_tags && ALLOWED_TAGS.contains(&name.as_str()) {
            match (closing, name.as_str()) {
                (true, "br") => {}
                (true, _) => {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
                (false, _) => {
                    out.push('<');
                    out.push_str(&name);
                    out.push('>');
                }
            }
        }
    }

    out.push_str(rest);
    out
}

/// Strip markup from every string inside a JSON value.
pub fn sanitize_payload(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_html(s, false)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_payload).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), sanitize_payload(v)))
                .collect::<Map<_, _>>(),
        ),
        other => other.clone(),
    }
}
