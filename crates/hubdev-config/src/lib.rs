//! Configuration for hubdev
//!
//! This crate handles:
//! - The user configuration file (`~/.config/hubdev/config.toml`)
//! - Resolving backend repository paths from `HUB_REPO_DIR`

mod error;
mod hub;

pub use error::*;
pub use hub::*;
