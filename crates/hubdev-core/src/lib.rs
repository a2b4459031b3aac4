//! Core logic for the hubdev build-and-mount workflow
//!
//! This crate provides:
//! - Transient server config mutation with idempotent restore
//! - Compose port mapping upsert
//! - Compose project lifecycle (mount with bounded retry, teardown)
//! - Health polling with a pure decision function
//! - The build pipeline that sequences all of the above

mod compose_ports;
mod context;
mod error;
mod lifecycle;
mod mutator;
mod pipeline;
mod poller;

pub use compose_ports::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use mutator::*;
pub use pipeline::*;
pub use poller::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
