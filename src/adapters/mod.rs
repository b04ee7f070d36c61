//! Adapters implementing the domain ports.
//!
//! - `mongo`: the production store, via the official driver
//! - `memory`: an in-process store with the same semantics, used in tests

pub mod memory;
pub mod mongo;
