//! Lattice Core: the state discretization engine.
//!
//! Maps the 4-dimensional continuous CartPole state space onto a uniform
//! bin lattice so that tabular value methods can index it. The mapping is
//! pure and total: every real-valued state resolves to a bin tuple.

pub mod grid;

// Re-exports for easier access by the adapter layer
pub use grid::{GridError, StateGrid, DEFAULT_BINS, STATE_DIMS};
