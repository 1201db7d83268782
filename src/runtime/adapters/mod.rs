//! Adapter implementations of the runtime ports.

pub mod memory;
