//! Free-text sanitization for fan submissions.
//!
//! Cleaning happens in a fixed order: entity decoding first (so encoded
//! payloads like `&lt;script&gt;` are seen by the tag passes), then
//! script/style elements with their bodies, then remaining tag syntax, then
//! non-tag attack patterns, then whitespace normalization, and truncation
//! last of all — truncation must never split a not-yet-removed tag.

/// Default cap for message content, matching the stored column contract.
pub const DEFAULT_MAX_LEN: usize = 500;

/// Default cap for name fields.
pub const NAME_MAX_LEN: usize = 100;

/// Entities that show up in encoded attack payloads. `&amp;` is decoded last
/// so a single pass does not cascade.
const ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#x27;", "'"),
    ("&#x2f;", "/"),
    ("&#39;", "'"),
    ("&#47;", "/"),
    ("&amp;", "&"),
];

/// Clean untrusted free text for storage and display.
///
/// Never panics; empty input yields an empty string. The result is at most
/// `max_len` characters.
pub fn sanitize(input: &str, max_len: usize) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut cleaned = decode_entities(input);
    cleaned = strip_element(&cleaned, "script");
    cleaned = strip_element(&cleaned, "style");
    cleaned = strip_tags(&cleaned);
    for scheme in ["javascript", "data", "vbscript"] {
        cleaned = strip_marker(&cleaned, scheme, b':');
    }
    cleaned = strip_event_handlers(&cleaned);
    cleaned = strip_marker(&cleaned, "expression", b'(');
    cleaned = collapse_whitespace(&cleaned);

    if cleaned.chars().count() > max_len {
        cleaned = cleaned.chars().take(max_len).collect();
    }
    cleaned
}

/// Stricter variant for name fields: general sanitization, then a whitelist
/// of Unicode letters/numbers plus space, hyphen, apostrophe and period.
pub fn sanitize_name(input: &str, max_len: usize) -> String {
    let cleaned = sanitize(input, max_len);
    cleaned
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '\'' | '.'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    for (entity, replacement) in ENTITIES {
        decoded = replace_ci(&decoded, entity, replacement);
    }
    decoded
}

/// Case-insensitive literal replacement. Needles are ASCII, so the
/// ASCII-lowercased haystack keeps the original byte offsets.
fn replace_ci(text: &str, needle: &str, replacement: &str) -> String {
    let hay = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while let Some(pos) = hay[i..].find(needle) {
        let start = i + pos;
        out.push_str(&text[i..start]);
        out.push_str(replacement);
        i = start + needle.len();
    }
    out.push_str(&text[i..]);
    out
}

/// Remove `<name ...> ... </name>` elements including their body. An
/// unclosed element is removed through the end of the input — leaving the
/// body behind would turn executable content into visible text.
fn strip_element(text: &str, name: &str) -> String {
    let open = format!("<{name}");
    let close = format!("</{name}");
    let hay = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut scan = 0;
    while let Some(pos) = hay[scan..].find(&open) {
        let start = scan + pos;
        let after_name = start + open.len();
        // `<scriptsomething>` is an ordinary tag, handled by strip_tags
        if hay
            .as_bytes()
            .get(after_name)
            .is_some_and(|b| b.is_ascii_alphanumeric())
        {
            scan = after_name;
            continue;
        }
        out.push_str(&text[copied..start]);
        let end = match hay[start..].find(&close) {
            Some(close_rel) => {
                let close_abs = start + close_rel;
                match hay[close_abs..].find('>') {
                    Some(gt) => close_abs + gt + 1,
                    None => hay.len(),
                }
            }
            None => hay.len(),
        };
        copied = end;
        scan = end;
    }
    out.push_str(&text[copied..]);
    out
}

/// Remove complete `<...>` spans. A `<` with no closing `>` stays, same as
/// the usual tag-matching behavior.
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let Some(lt) = rest.find('<') else { break };
        let Some(gt) = rest[lt..].find('>') else { break };
        out.push_str(&rest[..lt]);
        rest = &rest[lt + gt + 1..];
    }
    out.push_str(rest);
    out
}

/// Remove `word`, optional whitespace, and a terminator byte (`:` for URI
/// schemes, `(` for CSS expression), case-insensitive.
fn strip_marker(text: &str, word: &str, terminator: u8) -> String {
    let hay = text.to_ascii_lowercase();
    let bytes = hay.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut scan = 0;
    while let Some(pos) = hay[scan..].find(word) {
        let start = scan + pos;
        let mut j = start + word.len();
        while bytes.get(j).is_some_and(|b| b.is_ascii_whitespace()) {
            j += 1;
        }
        if bytes.get(j) == Some(&terminator) {
            out.push_str(&text[copied..start]);
            copied = j + 1;
            scan = j + 1;
        } else {
            scan = start + word.len();
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Remove inline event-handler attributes: `on` + word chars + optional
/// whitespace + `=`, at a word boundary.
fn strip_event_handlers(text: &str) -> String {
    let hay = text.to_ascii_lowercase();
    let bytes = hay.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut scan = 0;
    while let Some(pos) = hay[scan..].find("on") {
        let start = scan + pos;
        let at_boundary = start == 0 || !is_word_byte(bytes[start - 1]);
        let mut j = start + 2;
        while bytes.get(j).is_some_and(|b| is_word_byte(*b)) {
            j += 1;
        }
        let has_name = j > start + 2;
        let mut k = j;
        while bytes.get(k).is_some_and(|b| b.is_ascii_whitespace()) {
            k += 1;
        }
        if at_boundary && has_name && bytes.get(k) == Some(&b'=') {
            out.push_str(&text[copied..start]);
            copied = k + 1;
            scan = k + 1;
        } else {
            scan = start + 2;
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_blocks_with_body() {
        let out = sanitize("hello <script>alert('xss')</script>world", DEFAULT_MAX_LEN);
        assert_eq!(out, "hello world");
        assert!(!out.to_ascii_lowercase().contains("<script"));
    }

    #[test]
    fn strips_uppercase_script_blocks() {
        let out = sanitize("a <SCRIPT SRC=x>bad()</SCRIPT> b", DEFAULT_MAX_LEN);
        assert_eq!(out, "a b");
    }

    #[test]
    fn decodes_entities_before_stripping() {
        let out = sanitize("&lt;script&gt;alert(1)&lt;/script&gt;safe", DEFAULT_MAX_LEN);
        assert!(!out.to_ascii_lowercase().contains("<script"));
        assert!(!out.contains("alert"));
        assert_eq!(out, "safe");
    }

    #[test]
    fn unclosed_script_is_removed_to_end() {
        assert_eq!(sanitize("hi <script>steal()", DEFAULT_MAX_LEN), "hi");
    }

    #[test]
    fn strips_style_blocks() {
        assert_eq!(
            sanitize("x<style>body{color:red}</style>y", DEFAULT_MAX_LEN),
            "xy"
        );
    }

    #[test]
    fn strips_plain_tags_keeping_text() {
        assert_eq!(
            sanitize("Hello <b>world</b>", DEFAULT_MAX_LEN),
            "Hello world"
        );
    }

    #[test]
    fn removes_uri_schemes() {
        let out = sanitize("click javascript:alert(1) or DATA : here", DEFAULT_MAX_LEN);
        assert!(!out.to_ascii_lowercase().contains("javascript:"));
        assert!(!out.to_ascii_lowercase().contains("data :"));
    }

    #[test]
    fn removes_event_handlers_and_expression() {
        let out = sanitize("x onclick = alert(1) expression (gotcha)", DEFAULT_MAX_LEN);
        assert!(!out.to_ascii_lowercase().contains("onclick"));
        assert!(!out.to_ascii_lowercase().contains("expression ("));
    }

    #[test]
    fn online_is_not_a_handler() {
        // "on" followed by word chars but no '=' must survive
        assert_eq!(sanitize("we met online today", DEFAULT_MAX_LEN), "we met online today");
    }

    #[test]
    fn collapses_whitespace_and_trims() {
        assert_eq!(sanitize("  a \t\n  b  ", DEFAULT_MAX_LEN), "a b");
    }

    #[test]
    fn truncates_after_cleaning() {
        let long = "a".repeat(600);
        assert_eq!(sanitize(&long, DEFAULT_MAX_LEN).chars().count(), 500);
        assert_eq!(sanitize("hello world", 5), "hello");
    }

    #[test]
    fn truncation_is_char_boundary_safe() {
        let s = "héllo wörld ünïcode".repeat(40);
        let out = sanitize(&s, 10);
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn empty_input_yields_empty() {
        assert_eq!(sanitize("", DEFAULT_MAX_LEN), "");
        assert_eq!(sanitize("   ", DEFAULT_MAX_LEN), "");
        assert_eq!(sanitize("<b></b>", DEFAULT_MAX_LEN), "");
    }

    #[test]
    fn name_whitelist_keeps_letters_and_punctuation() {
        assert_eq!(
            sanitize_name("José O'Neil-Smith Jr.", NAME_MAX_LEN),
            "José O'Neil-Smith Jr."
        );
    }

    #[test]
    fn name_whitelist_drops_symbols() {
        assert_eq!(sanitize_name("Al!ce @#$%^&*()", NAME_MAX_LEN), "Alce");
        assert_eq!(sanitize_name("<img src=x>", NAME_MAX_LEN), "");
    }
}
