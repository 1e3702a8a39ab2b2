//! Layered context-assembly engine
//!
//! Given a working directory, an optional session id and a prompt, Synapse
//! resolves a persisted session, builds a normalized context, runs it
//! through the layers declared in the manifest, and wraps the composed text
//! in the payload the assistant host expects.
//!
//! # Architecture
//!
//! ```text
//!   resolve_hook_runtime ──> SessionStore ──> build_layer_context
//!                                                   |
//!                 HookPayload <── SynapseEngine <── Manifest + LayerRegistry
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use synapse_core::resolve_hook_runtime;
//!
//! # fn main() -> synapse_core::Result<()> {
//! if let Some(mut runtime) = resolve_hook_runtime(Some(Path::new(".")), Some("abc")) {
//!     let turn = runtime.process("fix the failing test")?;
//!     println!("{}", turn.payload.to_json()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod hook;
pub mod layer;
pub mod manifest;
pub mod runtime;
pub mod session;

pub use config::{ConfigResolver, deep_merge_value};
pub use context::{Context, ContextConfig, ContextInput, LayerOutput, build_layer_context};
pub use engine::{
    LayerFailure, LayerMetric, LayerStatus, RunMetrics, RunOutcome, RunState, SynapseEngine,
};
pub use error::{Error, Result};
pub use hook::{HookInput, HookPayload};
pub use layer::{Layer, LayerError, LayerInvocation, LayerRegistry};
pub use manifest::{LayerEntry, Manifest};
pub use runtime::{HookRuntime, TurnOutcome, resolve_from_input, resolve_hook_runtime};
pub use session::{Session, SessionLoad, SessionStore};
