use crate::block::block_tree::{BlockNode, Document, Node};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Non-fatal diagnostics produced while parsing serialized content.
/// Parsing itself never fails: a malformed delimiter degrades to "keep
/// the markup, drop the broken piece" rather than failing the render.
#[derive(Debug, Error)]
pub enum BlockParseError {
    #[error("invalid attributes JSON on wp:{name}: {source}")]
    InvalidAttrs {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("closer for wp:{found} does not match open block wp:{open}")]
    MismatchedCloser { found: String, open: String },

    #[error("closer for wp:{0} with no block open")]
    StrayCloser(String),

    #[error("block wp:{0} left open at end of input")]
    UnclosedBlock(String),
}

/// Matches one serialized block delimiter:
///
/// ```text
/// <!-- wp:ns/name {"attr":1} -->   opener
/// <!-- /wp:ns/name -->             closer
/// <!-- wp:ns/name {"attr":1} /-->  void block
/// ```
///
/// The attribute payload is JSON; `\{.*?\}` is extended lazily until the
/// closing `-->` also matches, so nested object braces are covered.
fn delimiter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)<!--\s+(?P<closer>/)?wp:(?P<name>[a-z][a-z0-9_-]*(?:/[a-z][a-z0-9_-]*)?)(?:\s+(?P<attrs>\{.*?\}))?\s*(?P<void>/)?-->",
        )
        .expect("block delimiter regex must compile")
    })
}

/// Parse serialized block content, logging any diagnostics.
pub fn parse_document(content: &str) -> Document {
    let (document, warnings) = parse_document_with_diagnostics(content);
    for warning in &warnings {
        log::warn!("{}", warning);
    }
    document
}

/// Parse serialized block content and return the diagnostics alongside
/// the tree instead of logging them.
pub fn parse_document_with_diagnostics(content: &str) -> (Document, Vec<BlockParseError>) {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<BlockNode> = Vec::new();
    let mut warnings: Vec<BlockParseError> = Vec::new();
    let mut cursor = 0;

    for caps in delimiter_re().captures_iter(content) {
        let Some(delimiter) = caps.get(0) else {
            continue;
        };

        if delimiter.start() > cursor {
            push_markup(&mut stack, &mut root, &content[cursor..delimiter.start()]);
        }
        cursor = delimiter.end();

        let name = caps["name"].to_string();
        if caps.name("closer").is_some() {
            close_block(name, &mut stack, &mut root, &mut warnings);
        } else {
            let attrs = parse_attrs(&name, caps.name("attrs").map(|m| m.as_str()), &mut warnings);
            let block = BlockNode {
                name,
                attrs,
                children: Vec::new(),
            };
            if caps.name("void").is_some() {
                push_node(&mut stack, &mut root, Node::Block(block));
            } else {
                stack.push(block);
            }
        }
    }

    if cursor < content.len() {
        push_markup(&mut stack, &mut root, &content[cursor..]);
    }

    // Auto-close whatever is still open so no markup is lost.
    while let Some(block) = stack.pop() {
        warnings.push(BlockParseError::UnclosedBlock(block.name.clone()));
        push_node(&mut stack, &mut root, Node::Block(block));
    }

    (Document { nodes: root }, warnings)
}

fn parse_attrs(
    name: &str,
    attrs: Option<&str>,
    warnings: &mut Vec<BlockParseError>,
) -> Map<String, Value> {
    let Some(json) = attrs else {
        return Map::new();
    };
    match serde_json::from_str::<Map<String, Value>>(json) {
        Ok(map) => map,
        Err(source) => {
            warnings.push(BlockParseError::InvalidAttrs {
                name: name.to_string(),
                source,
            });
            Map::new()
        }
    }
}

fn close_block(
    name: String,
    stack: &mut Vec<BlockNode>,
    root: &mut Vec<Node>,
    warnings: &mut Vec<BlockParseError>,
) {
    match stack.pop() {
        Some(open) => {
            if open.name != name {
                warnings.push(BlockParseError::MismatchedCloser {
                    found: name,
                    open: open.name.clone(),
                });
            }
            push_node(stack, root, Node::Block(open));
        }
        None => warnings.push(BlockParseError::StrayCloser(name)),
    }
}

fn push_markup(stack: &mut [BlockNode], root: &mut Vec<Node>, text: &str) {
    push_node(stack, root, Node::Markup(text.to_string()));
}

fn push_node(stack: &mut [BlockNode], root: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(open) => open.children.push(node),
        None => root.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block<'a>(node: &'a Node) -> &'a BlockNode {
        match node {
            Node::Block(block) => block,
            other => panic!("expected block node, got {:?}", other),
        }
    }

    fn markup(node: &Node) -> &str {
        match node {
            Node::Markup(text) => text,
            other => panic!("expected markup node, got {:?}", other),
        }
    }

    #[test]
    fn parses_flat_blocks_and_freeform_markup() {
        let content = "<h1>Title</h1>\
            <!-- wp:core/paragraph {\"feCustomCSS\":\"{{SELECTOR}} { color: red; }\"} --><p>Hello</p><!-- /wp:core/paragraph -->\
            <footer>bye</footer>";
        let (document, warnings) = parse_document_with_diagnostics(content);

        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
        assert_eq!(document.nodes.len(), 3);
        assert_eq!(markup(&document.nodes[0]), "<h1>Title</h1>");
        let paragraph = block(&document.nodes[1]);
        assert_eq!(paragraph.name, "core/paragraph");
        assert_eq!(paragraph.custom_css(), Some("{{SELECTOR}} { color: red; }"));
        assert_eq!(markup(&paragraph.children[0]), "<p>Hello</p>");
        assert_eq!(markup(&document.nodes[2]), "<footer>bye</footer>");
    }

    #[test]
    fn parses_nested_blocks() {
        let content = "<!-- wp:core/group --><div class=\"group\">\
            <!-- wp:core/paragraph --><p>inner</p><!-- /wp:core/paragraph -->\
            </div><!-- /wp:core/group -->";
        let (document, warnings) = parse_document_with_diagnostics(content);

        assert!(warnings.is_empty());
        assert_eq!(document.nodes.len(), 1);
        let group = block(&document.nodes[0]);
        assert_eq!(group.name, "core/group");
        assert_eq!(group.children.len(), 3);
        assert_eq!(block(&group.children[1]).name, "core/paragraph");
    }

    #[test]
    fn parses_void_blocks_and_nested_attr_objects() {
        let content =
            "<!-- wp:core/spacer {\"height\":{\"px\":20},\"feCustomCSS\":\"%root% { margin: 0; }\"} /-->";
        let (document, warnings) = parse_document_with_diagnostics(content);

        assert!(warnings.is_empty());
        let spacer = block(&document.nodes[0]);
        assert_eq!(spacer.name, "core/spacer");
        assert!(spacer.children.is_empty());
        assert_eq!(spacer.custom_css(), Some("%root% { margin: 0; }"));
    }

    #[test]
    fn names_without_namespace_are_accepted() {
        let (document, warnings) =
            parse_document_with_diagnostics("<!-- wp:paragraph --><p>x</p><!-- /wp:paragraph -->");
        assert!(warnings.is_empty());
        assert_eq!(block(&document.nodes[0]).name, "paragraph");
    }

    #[test]
    fn invalid_attrs_json_keeps_block_with_empty_attrs() {
        let content = "<!-- wp:core/group {\"broken\": } --><div></div><!-- /wp:core/group -->";
        let (document, warnings) = parse_document_with_diagnostics(content);

        let group = block(&document.nodes[0]);
        assert!(group.attrs.is_empty());
        assert_eq!(markup(&group.children[0]), "<div></div>");
        assert!(matches!(
            warnings.as_slice(),
            [BlockParseError::InvalidAttrs { name, .. }] if name == "core/group"
        ));
    }

    #[test]
    fn stray_closer_is_dropped_with_warning() {
        let (document, warnings) =
            parse_document_with_diagnostics("<p>a</p><!-- /wp:core/group --><p>b</p>");

        assert_eq!(document.nodes.len(), 2);
        assert_eq!(markup(&document.nodes[0]), "<p>a</p>");
        assert_eq!(markup(&document.nodes[1]), "<p>b</p>");
        assert!(matches!(
            warnings.as_slice(),
            [BlockParseError::StrayCloser(name)] if name == "core/group"
        ));
    }

    #[test]
    fn unclosed_block_is_auto_closed_at_end_of_input() {
        let (document, warnings) =
            parse_document_with_diagnostics("<!-- wp:core/group --><div>open</div>");

        let group = block(&document.nodes[0]);
        assert_eq!(markup(&group.children[0]), "<div>open</div>");
        assert!(matches!(
            warnings.as_slice(),
            [BlockParseError::UnclosedBlock(name)] if name == "core/group"
        ));
    }

    #[test]
    fn mismatched_closer_closes_open_block_with_warning() {
        let content = "<!-- wp:core/group --><div></div><!-- /wp:core/columns -->";
        let (document, warnings) = parse_document_with_diagnostics(content);

        assert_eq!(block(&document.nodes[0]).name, "core/group");
        assert!(matches!(
            warnings.as_slice(),
            [BlockParseError::MismatchedCloser { found, open }]
                if found == "core/columns" && open == "core/group"
        ));
    }
}
