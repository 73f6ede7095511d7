pub mod block;
pub mod fe_render;
pub mod parser;
pub mod style;

pub use block::block_tree::{BlockNode, Document, Node};
pub use fe_render::{fe_page, RenderContext};
pub use style::block_id::{derive_block_id, BLOCK_ID_ATTR};
pub use style::sanitize::{sanitize, SanitizationResult};
