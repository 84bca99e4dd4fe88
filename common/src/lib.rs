pub mod color;
pub mod config;
pub mod rotation;
