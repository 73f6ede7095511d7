pub mod block_id;
pub mod collector;
pub mod emit;
pub mod sanitize;
