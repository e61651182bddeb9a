//! slotbook application library
//!
//! Feature modules (accounts, bookings, services) and the bootstrap that wires
//! them onto the kernel, store and HTTP crates.

pub mod bootstrap;
pub mod modules;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use bootstrap::{run, AppContext};
