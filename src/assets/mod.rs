pub mod paths;
pub mod source;
pub mod store;
