//! Filesystem primitives for the Synapse context engine
//!
//! Provides normalized paths, locked atomic writes, and format-aware
//! loading/saving of the small JSON and TOML records Synapse keeps on disk.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::SynapsePath;
pub use error::{Error, Result};
pub use io::FileLock;
pub use path::{NormalizedPath, validate_path_identifier, validate_relative_path};
