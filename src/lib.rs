pub mod analysis;
pub mod config;
pub mod pose;
pub mod render;
pub mod replay;
