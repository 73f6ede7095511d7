use crate::block::block_tree::{BlockNode, Document, Node};
use crate::parser::fe_blocks;
use crate::style::block_id::{derive_block_id, BLOCK_ID_ATTR};
use crate::style::collector::{self, StyleMap};
use crate::style::emit;
use regex::Regex;
use std::sync::OnceLock;

/// Per-render pipeline state: the collected style map plus a guard so
/// the style element reaches the page at most once. One context per
/// render; never share it across requests.
pub struct RenderContext {
    styles: StyleMap,
    emitted: bool,
}

impl RenderContext {
    pub fn new(styles: StyleMap) -> Self {
        RenderContext {
            styles,
            emitted: false,
        }
    }

    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// The page's style element, the first time only. Every later call
    /// gets `None`, so competing code paths cannot duplicate the
    /// output.
    pub fn take_style_element(&mut self) -> Option<String> {
        if self.emitted {
            return None;
        }
        self.emitted = true;
        emit::style_element(&self.styles)
    }
}

pub mod fe_page {
    use super::*;

    /// Render serialized block content into the final page markup,
    /// with the scoped custom-CSS style element appended once after
    /// all block content.
    pub fn generate(content: &str) -> String {
        let document = fe_blocks::parse_document(content);
        render_document(&document)
    }

    /// Same pipeline over an already-built block tree.
    pub fn render_document(document: &Document) -> String {
        let mut ctx = RenderContext::new(collector::collect(document));
        let mut out = String::new();
        render_nodes(&document.nodes, &ctx, &mut out);
        if let Some(style_el) = ctx.take_style_element() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&style_el);
        }
        out
    }
}

fn render_nodes(nodes: &[Node], ctx: &RenderContext, out: &mut String) {
    for node in nodes {
        match node {
            Node::Markup(text) => out.push_str(text),
            Node::Block(block) => render_block(block, ctx, out),
        }
    }
}

fn render_block(block: &BlockNode, ctx: &RenderContext, out: &mut String) {
    let mut inner = String::new();
    render_nodes(&block.children, ctx, &mut inner);

    // The data attribute is attached only when the collector kept an
    // entry for this CSS, i.e. sanitization passed. Rejected payloads
    // leave the markup untagged so no id without a matching rule leaks
    // into the page.
    match block.custom_css().map(derive_block_id) {
        Some(id) if ctx.styles().contains_key(&id) => out.push_str(&tag_root_element(&inner, &id)),
        _ => out.push_str(&inner),
    }
}

/// First opening tag of a rendered fragment.
fn opening_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<[a-zA-Z][a-zA-Z0-9-]*(?:\s[^<>]*)?>").expect("opening tag regex must compile")
    })
}

/// Inject the block-id attribute into the first opening tag of the
/// fragment, the outermost tag of the block's rendered markup. The id
/// string must stay bit-exact with the one the collector derived or the
/// emitted selector will not match.
fn tag_root_element(markup: &str, block_id: &str) -> String {
    let Some(tag) = opening_tag_re().find(markup) else {
        log::debug!("no root element to tag for block id {}", block_id);
        return markup.to_string();
    };
    if tag.as_str().contains(BLOCK_ID_ATTR) {
        // Already tagged by a nested block that shares the root tag.
        return markup.to_string();
    }

    let insert_at = if tag.as_str().ends_with("/>") {
        tag.end() - 2
    } else {
        tag.end() - 1
    };
    let mut out = String::with_capacity(markup.len() + BLOCK_ID_ATTR.len() + block_id.len() + 4);
    out.push_str(markup[..insert_at].trim_end());
    out.push(' ');
    out.push_str(BLOCK_ID_ATTR);
    out.push_str("=\"");
    out.push_str(&htmlize::escape_attribute(block_id));
    out.push('"');
    if tag.as_str().ends_with("/>") {
        out.push_str(" />");
        out.push_str(&markup[tag.end()..]);
    } else {
        out.push_str(&markup[insert_at..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::collector::StyleEntry;
    use pretty_assertions::assert_eq;

    fn context_with(css: &str) -> (RenderContext, String) {
        let id = derive_block_id(css);
        let mut styles = StyleMap::new();
        styles.insert(
            id.clone(),
            StyleEntry {
                block_id: id.clone(),
                raw_css: css.to_string(),
                sanitized_css: css.to_string(),
            },
        );
        (RenderContext::new(styles), id)
    }

    #[test]
    fn root_element_gets_the_attribute() {
        assert_eq!(
            tag_root_element("<div class=\"a\"><p>x</p></div>", "fe-1234abcd"),
            "<div class=\"a\" data-fe-block-id=\"fe-1234abcd\"><p>x</p></div>"
        );
    }

    #[test]
    fn bare_tag_gets_the_attribute() {
        assert_eq!(
            tag_root_element("<p>x</p>", "fe-1234abcd"),
            "<p data-fe-block-id=\"fe-1234abcd\">x</p>"
        );
    }

    #[test]
    fn self_closing_root_tag_is_handled() {
        assert_eq!(
            tag_root_element("<img src=\"a.png\" />", "fe-1234abcd"),
            "<img src=\"a.png\" data-fe-block-id=\"fe-1234abcd\" />"
        );
    }

    #[test]
    fn fragment_without_element_passes_through() {
        assert_eq!(tag_root_element("just text", "fe-1234abcd"), "just text");
    }

    #[test]
    fn already_tagged_root_is_left_alone() {
        let markup = "<div data-fe-block-id=\"fe-aaaaaaaa\">x</div>";
        assert_eq!(tag_root_element(markup, "fe-1234abcd"), markup);
    }

    #[test]
    fn take_style_element_yields_exactly_once() {
        let (mut ctx, _) = context_with("{{SELECTOR}} { color: red; }");
        assert!(ctx.take_style_element().is_some());
        assert!(ctx.take_style_element().is_none());
        assert!(ctx.take_style_element().is_none());
    }

    #[test]
    fn empty_style_map_emits_nothing_but_still_arms_the_guard() {
        let mut ctx = RenderContext::new(StyleMap::new());
        assert!(ctx.take_style_element().is_none());
        assert!(ctx.take_style_element().is_none());
    }
}
