//! Layered engine configuration
//!
//! Configuration is loaded and merged from these sources (later sources
//! override earlier ones, tables are deep-merged):
//!
//! 1. **Global defaults** - `<config_dir>/synapse/config.toml`
//! 2. **Root config** - `.synapse/config.toml`
//! 3. **Local overrides** - `.synapse/config.local.toml` (git-ignored)
//!
//! The merged table becomes the caller-supplied `config` blob of the
//! layer context, e.g. `devmode = true`.

mod resolver;

pub use resolver::{ConfigResolver, deep_merge_value};
