use crate::block::block_tree::{BlockNode, Document, Node};
use crate::style::block_id::derive_block_id;
use crate::style::sanitize::{sanitize, SanitizationResult};
use indexmap::IndexMap;

/// One sanitized, scopable CSS payload, keyed in the [`StyleMap`] by
/// its derived block id. Built fresh for each render pass and never
/// persisted across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEntry {
    pub block_id: String,
    pub raw_css: String,
    pub sanitized_css: String,
}

/// Insertion-ordered so emission is deterministic within one render.
pub type StyleMap = IndexMap<String, StyleEntry>;

/// Walk the block tree depth-first in document order and build the
/// per-render style map.
///
/// Blocks without a custom-CSS attribute are skipped. Blocks whose CSS
/// the sanitizer rejects are dropped silently; that is the defined
/// failure behavior, nothing here can fail the render. Identical CSS on
/// several blocks derives the same id and is kept once.
pub fn collect(document: &Document) -> StyleMap {
    let mut entries = StyleMap::new();
    collect_nodes(&document.nodes, &mut entries);
    entries
}

fn collect_nodes(nodes: &[Node], entries: &mut StyleMap) {
    for node in nodes {
        if let Node::Block(block) = node {
            collect_block(block, entries);
            collect_nodes(&block.children, entries);
        }
    }
}

fn collect_block(block: &BlockNode, entries: &mut StyleMap) {
    let Some(raw) = block.custom_css() else {
        return;
    };
    let block_id = derive_block_id(raw);
    if entries.contains_key(&block_id) {
        // Same CSS as an earlier block; the shared entry covers both.
        return;
    }
    match sanitize(raw) {
        SanitizationResult::Clean(sanitized_css) => {
            if sanitized_css.trim().is_empty() {
                // Tag-stripping can leave nothing behind; an entry with
                // no rule would still get the block's markup tagged.
                log::debug!("dropping empty custom CSS on {}", block.name);
                return;
            }
            entries.insert(
                block_id.clone(),
                StyleEntry {
                    block_id,
                    raw_css: raw.to_string(),
                    sanitized_css,
                },
            );
        }
        SanitizationResult::Rejected(reason) => {
            log::debug!("dropping custom CSS on {}: {}", block.name, reason);
        }
    }
}
