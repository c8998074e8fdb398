//! End-to-End Test Harness for the niche subsystem
//!
//! Wires a fixture-backed record store, an in-memory change feed, the
//! invalidation bus and the option cache together the way an application
//! would, so scenarios can drive the whole stack.

pub mod harness;

pub use harness::{sample_fixture, NicheStack};
