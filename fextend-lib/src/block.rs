use serde::{Deserialize, Serialize};

pub mod block_tree {
    use super::*;
    use serde_json::{Map, Value};

    /// Attribute key a block uses to carry author-supplied CSS.
    pub const CUSTOM_CSS_ATTR: &str = "feCustomCSS";

    /// A node in the parsed content tree: either a block with its own
    /// attributes and children, or a raw markup chunk passed through
    /// verbatim (freeform HTML between blocks, and block inner content).
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Node {
        Markup(String),
        Block(BlockNode),
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct BlockNode {
        pub name: String,
        #[serde(default)]
        pub attrs: Map<String, Value>,
        #[serde(default)]
        pub children: Vec<Node>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Document {
        pub nodes: Vec<Node>,
    }

    impl BlockNode {
        pub fn new(name: String) -> Self {
            BlockNode {
                name,
                attrs: Map::new(),
                children: Vec::new(),
            }
        }

        /// Author-supplied CSS for this block, if any. A missing,
        /// non-string, or blank attribute is the normal "no custom CSS"
        /// case and reads as `None`.
        pub fn custom_css(&self) -> Option<&str> {
            match self.attrs.get(CUSTOM_CSS_ATTR) {
                Some(Value::String(css)) if !css.trim().is_empty() => Some(css),
                _ => None,
            }
        }
    }

    pub fn new_document() -> Document {
        Document { nodes: Vec::new() }
    }
}
