//! Process lifecycle around the workflow engines.
//!
//! The [`services::ShutdownCoordinator`] owns the shutdown flag and runs the
//! ordered drain sequence once; [`services::ShutdownHandle`] clones gate
//! webhook admission and periodic work. [`services::Operations`] aggregates
//! health and exposes the admin toggles.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
