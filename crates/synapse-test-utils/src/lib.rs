//! Shared test utilities for the synapse workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`workspace`]: [`TestSynapse`] builder for a working directory with a
//!   `.synapse` root, manifest, layer files and session records

pub mod workspace;

pub use workspace::TestSynapse;
