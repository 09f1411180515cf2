pub mod error;
pub mod config;
pub mod preprocessing;
pub mod resnet;
pub mod distance;
pub mod color;
pub mod models;
pub mod index;
pub mod list_index;
pub mod quadtree;
pub mod hash_index;
pub mod ann;
pub mod commands;
pub mod junk_drawer;

pub use error::{Error, Result};
