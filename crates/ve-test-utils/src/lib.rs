//! Test utilities for the Voicegate override engine.
//!
//! Provides the shared fakes used by engine integration tests and the
//! space controller test suites:
//!
//! - [`TestDirectory`] - mutable in-memory participant directory
//! - [`ReverbProbe`] / [`ReverbMonitor`] - counting reverb routing
//! - [`fixtures`] - participant and override builders

pub mod directory;
pub mod fixtures;
pub mod reverb;

pub use directory::TestDirectory;
pub use reverb::{ReverbMonitor, ReverbProbe};
