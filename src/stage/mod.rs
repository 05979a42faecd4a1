pub mod effects;
pub mod floater;
pub mod lanes;
pub mod manager;
