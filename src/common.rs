pub mod error;
pub mod masks;
pub mod payload;
pub mod scope;
