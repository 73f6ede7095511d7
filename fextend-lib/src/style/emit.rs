use crate::style::block_id::BLOCK_ID_ATTR;
use crate::style::collector::StyleMap;
use regex::{NoExpand, Regex};
use std::sync::OnceLock;

/// id of the single style element appended to the page.
pub const STYLE_ELEMENT_ID: &str = "fe-custom-css";

/// Placeholder authors type in place of the concrete selector. The
/// canonical token is `{{SELECTOR}}`, matched case-insensitively; the
/// older `%root%` syntax is accepted as an input alias so previously
/// authored CSS keeps working.
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\{\{selector\}\}|%root%").expect("placeholder regex must compile")
    })
}

/// The concrete attribute selector for one derived block id, with the
/// id escaped for use inside a double-quoted attribute value.
pub fn block_selector(block_id: &str) -> String {
    format!(
        "[{}=\"{}\"]",
        BLOCK_ID_ATTR,
        htmlize::escape_attribute(block_id)
    )
}

/// Substitute every placeholder occurrence with the concrete selector.
pub fn scope_css(css: &str, selector: &str) -> String {
    placeholder_re()
        .replace_all(css, NoExpand(selector))
        .into_owned()
}

/// Concatenate every entry's scoped CSS in map insertion order. An
/// empty map yields an empty string.
pub fn emit(entries: &StyleMap) -> String {
    let mut out = String::new();
    for entry in entries.values() {
        let selector = block_selector(&entry.block_id);
        let scoped = scope_css(&entry.sanitized_css, &selector);
        let scoped = scoped.trim();
        if scoped.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(scoped);
    }
    out
}

/// The page's style element, or `None` when there is nothing to emit
/// (no element at all is rendered in that case).
pub fn style_element(entries: &StyleMap) -> Option<String> {
    let css = emit(entries);
    if css.is_empty() {
        None
    } else {
        Some(format!(
            "<style id=\"{}\">\n{}\n</style>",
            STYLE_ELEMENT_ID, css
        ))
    }
}
