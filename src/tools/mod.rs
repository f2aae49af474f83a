pub mod adaptive_tree;
pub mod bitstream;
pub mod window;
