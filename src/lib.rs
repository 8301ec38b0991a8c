//! Interactive viewer for metabolic flux networks and subsystem correlation
//! graphs served by a flux-balance analysis backend.

pub mod app;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod util;

#[cfg(test)]
mod test_fixtures;
