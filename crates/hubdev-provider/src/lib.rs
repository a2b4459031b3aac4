//! Process execution and container runtime queries for hubdev
//!
//! Everything here talks to the outside world through [`CommandRunner`], so
//! the container runtime can be swapped for a scripted runner in tests.

mod docker;
mod error;
mod inspect;
mod runner;
mod types;

pub use docker::DockerHost;
pub use error::*;
pub use inspect::*;
pub use runner::*;
pub use types::*;
