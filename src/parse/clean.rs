//! Pre-parse normalization of raw XML text.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static NAMESPACE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\s+xmlns(:[\w.-]+)?\s*=\s*("[^"]*"|'[^']*')"#)
        .expect("valid namespace regex")
});
// Prefixes of an element name, in start and end tags: `<nfe:` or `</ds:`.
static ELEMENT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(</?)(?:[A-Za-z_][\w.-]*:)+").expect("valid element prefix regex")
});
static START_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[A-Za-z_][^<>]*>").expect("valid start tag regex"));
static ATTRIBUTE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\s)(?:[A-Za-z_][\w.-]*:)+([A-Za-z_][\w.-]*\s*=)")
        .expect("valid attribute prefix regex")
});
static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").expect("valid control character regex")
});
// Matches every `&`, with the entity reference that follows it when there is one.
static AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#?\w+;)?").expect("valid ampersand regex"));

/// Normalize raw XML before parsing.
///
/// Strips a leading byte-order mark, comments and namespace declarations
/// along with the prefixes they bound, so `<nfe:NFe>` reads as `<NFe>`.
/// Drops control characters XML 1.0 forbids, escapes every `&` that does
/// not start an entity reference and trims surrounding whitespace. Empty
/// input stays empty.
///
/// ```
/// use notafiscal::parse::clean_xml_content;
///
/// let cleaned = clean_xml_content("\u{FEFF}<a xmlns=\"urn:x\">P & D</a>");
/// assert_eq!(cleaned, "<a>P &amp; D</a>");
///
/// let cleaned = clean_xml_content(r#"<nfe:NFe xmlns:nfe="urn:x"><nfe:ide/></nfe:NFe>"#);
/// assert_eq!(cleaned, "<NFe><ide/></NFe>");
/// ```
pub fn clean_xml_content(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    let content = COMMENT.replace_all(content, "");
    let content = NAMESPACE_DECL.replace_all(&content, "");
    let content = ELEMENT_PREFIX.replace_all(&content, "$1");
    let content = START_TAG.replace_all(&content, |caps: &Captures<'_>| {
        ATTRIBUTE_PREFIX.replace_all(&caps[0], "$1$2").into_owned()
    });
    let content = CONTROL_CHARS.replace_all(&content, "");
    let content = AMPERSAND.replace_all(&content, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            caps[0].to_string()
        } else {
            "&amp;".to_string()
        }
    });
    content.trim().to_string()
}
