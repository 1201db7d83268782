//! Adapter implementations for workflow ports.

pub mod memory;
