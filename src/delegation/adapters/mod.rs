//! Adapter implementations for delegation ports.

pub mod memory;
