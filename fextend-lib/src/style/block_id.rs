use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Attribute carried by a qualifying block's outermost rendered tag.
/// The emitted stylesheet targets the same attribute, so both sides
/// must use the identical id string.
pub const BLOCK_ID_ATTR: &str = "data-fe-block-id";

const ID_PREFIX: &str = "fe-";
const ID_HEX_CHARS: usize = 8;

/// Derive the stable block id for one CSS payload.
///
/// The id is a pure function of the CSS text (`fe-` plus the first 8
/// hex characters of its SHA-256 digest), so the same payload maps to
/// the same id within and across runs, and identical CSS on several
/// blocks collapses to one shared id. The output is safe both as an
/// HTML attribute value and inside a CSS attribute selector.
pub fn derive_block_id(css: &str) -> String {
    let digest = Sha256::digest(css.as_bytes());
    let mut id = String::with_capacity(ID_PREFIX.len() + ID_HEX_CHARS);
    id.push_str(ID_PREFIX);
    for byte in &digest[..ID_HEX_CHARS / 2] {
        // Writing into a String cannot fail.
        let _ = write!(id, "{:02x}", byte);
    }
    id
}
