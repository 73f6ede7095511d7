pub mod fe_blocks;
