pub mod flash;
pub mod reveal;
pub mod sequence;
