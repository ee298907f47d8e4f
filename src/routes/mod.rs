pub mod meta;
pub mod ops;
