//! Sequential layer execution
//!
//! The [`SynapseEngine`] loads the manifest, runs each enabled layer in
//! order against the accumulated context, and composes the fragments into
//! the text handed to the host. Layer failures are isolated: the failing
//! layer contributes an empty fragment and the run continues, unless the
//! manifest is `strict`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::{Context, ContextInput, LayerOutput, build_layer_context};
use crate::layer::{LayerError, LayerInvocation, LayerRegistry};
use crate::manifest::{LayerEntry, Manifest};
use crate::session::Session;
use crate::{Error, Result};

/// Lifecycle of a single run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running { index: usize },
    Completed,
    Failed { index: usize, cause: String },
}

/// A recorded, non-fatal layer failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFailure {
    pub layer: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    /// Produced a non-empty fragment
    Contributed,
    /// Ran successfully with nothing to say
    Empty,
    Failed,
}

/// Timing for one executed layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetric {
    pub layer: String,
    pub status: LayerStatus,
    pub elapsed_us: u64,
    /// Whether the layer ran past its declared `budget_ms`
    pub over_budget: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub total_us: u64,
    pub layers: Vec<LayerMetric>,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    /// Composed text for the host
    pub text: String,
    /// Session after the run, prompt count already incremented
    pub session: Session,
    /// Every layer output of the run, including those supplied up front
    pub previous_layers: Vec<LayerOutput>,
    pub errors: Vec<LayerFailure>,
    pub state: RunState,
    pub metrics: RunMetrics,
}

/// Runs manifest layers against a context
#[derive(Debug)]
pub struct SynapseEngine {
    synapse_path: PathBuf,
    registry: LayerRegistry,
}

impl SynapseEngine {
    /// Create an engine bound to `synapse_path` with the built-in layers.
    pub fn new(synapse_path: impl Into<PathBuf>) -> Self {
        Self::with_registry(synapse_path, LayerRegistry::with_builtins())
    }

    pub fn with_registry(synapse_path: impl Into<PathBuf>, registry: LayerRegistry) -> Self {
        Self {
            synapse_path: synapse_path.into(),
            registry,
        }
    }

    pub fn synapse_path(&self) -> &Path {
        &self.synapse_path
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LayerRegistry {
        &mut self.registry
    }

    /// Load the current on-disk manifest. Never cached.
    pub fn load_manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.synapse_path)
    }

    /// Build a context for `prompt` and run it.
    ///
    /// The loaded manifest is exposed to layers as `config.manifest`, and
    /// `config` is the caller's configuration blob.
    pub fn process(
        &self,
        prompt: &str,
        session: Session,
        config: Map<String, Value>,
    ) -> Result<RunOutcome> {
        let manifest = self.load_manifest()?;
        let input = ContextInput::new(&self.synapse_path)
            .with_prompt(prompt)
            .with_session(session)
            .with_config(config);
        let context = build_layer_context(&input)?;
        self.execute(&manifest, context)
    }

    /// Run the current manifest against an already-built context.
    ///
    /// `context.config.manifest` is replaced by the manifest actually loaded,
    /// so layers always see what is running.
    pub fn run(&self, context: Context) -> Result<RunOutcome> {
        let manifest = self.load_manifest()?;
        self.execute(&manifest, context)
    }

    fn execute(&self, manifest: &Manifest, mut context: Context) -> Result<RunOutcome> {
        let started = Instant::now();
        context.config.manifest = manifest.to_mapping();
        let entries = manifest.ordered_layers();
        let mut state = RunState::Pending;
        tracing::debug!(?state, layers = entries.len(), "Starting run");

        let mut fragments: Vec<(&str, String)> = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();
        let mut metrics = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            state = RunState::Running { index };
            tracing::trace!(
                ?state,
                layer = %entry.name,
                kind = entry.kind(),
                "Running layer"
            );

            let layer_started = Instant::now();
            let result = self.invoke(entry, &mut context);
            let elapsed = layer_started.elapsed();

            let over_budget = entry
                .budget_ms
                .is_some_and(|budget| elapsed > Duration::from_millis(budget));
            if over_budget {
                tracing::warn!(
                    layer = %entry.name,
                    ?elapsed,
                    budget_ms = entry.budget_ms,
                    "Layer exceeded its budget"
                );
            }

            let (fragment, status) = match result {
                Ok(fragment) if fragment.is_empty() => (fragment, LayerStatus::Empty),
                Ok(fragment) => (fragment, LayerStatus::Contributed),
                Err(err) => {
                    let message = err.to_string();
                    if manifest.strict {
                        state = RunState::Failed {
                            index,
                            cause: message.clone(),
                        };
                        tracing::error!(
                            ?state,
                            layer = %entry.name,
                            "Strict manifest: aborting run"
                        );
                        return Err(Error::LayerFailed {
                            layer: entry.name.clone(),
                            message,
                        });
                    }
                    tracing::warn!(
                        layer = %entry.name,
                        error = %message,
                        "Layer failed; substituting empty output"
                    );
                    errors.push(LayerFailure {
                        layer: entry.name.clone(),
                        message,
                    });
                    (String::new(), LayerStatus::Failed)
                }
            };

            metrics.push(LayerMetric {
                layer: entry.name.clone(),
                status,
                elapsed_us: duration_us(elapsed),
                over_budget,
            });
            context
                .previous_layers
                .push(LayerOutput::new(entry.name.clone(), fragment.clone()));
            fragments.push((entry.separator(), fragment));
        }

        state = RunState::Completed;
        context.session.prompt_count = context.session.prompt_count.saturating_add(1);
        context.session.updated_at = Some(Utc::now());

        let text = compose(&fragments);
        let metrics = RunMetrics {
            total_us: duration_us(started.elapsed()),
            layers: metrics,
        };
        tracing::info!(
            ?state,
            prompt_count = context.session.prompt_count,
            failures = errors.len(),
            chars = text.len(),
            "Run completed"
        );

        Ok(RunOutcome {
            text,
            session: context.session,
            previous_layers: context.previous_layers,
            errors,
            state,
            metrics,
        })
    }

    /// Execute one entry against its own copy of the state slot.
    ///
    /// The slot is written back only on success, so a failing or panicking
    /// layer never leaves half-updated state behind.
    fn invoke(
        &self,
        entry: &LayerEntry,
        context: &mut Context,
    ) -> std::result::Result<String, LayerError> {
        let kind = entry.kind();
        let layer = self.registry.get(kind).ok_or_else(|| LayerError::UnknownKind {
            kind: kind.to_string(),
        })?;

        let Context {
            prompt,
            session,
            config,
            previous_layers,
        } = context;
        let mut slot = session.state.get(&entry.name).cloned().unwrap_or(Value::Null);

        let result = {
            let mut invocation = LayerInvocation {
                name: &entry.name,
                prompt: prompt.as_str(),
                prompt_count: session.prompt_count,
                config: &*config,
                settings: &entry.settings,
                previous_layers: previous_layers.as_slice(),
                state: &mut slot,
            };
            panic::catch_unwind(AssertUnwindSafe(|| layer.execute(&mut invocation))).unwrap_or_else(
                |payload| {
                    Err(LayerError::Panicked {
                        message: panic_message(payload.as_ref()),
                    })
                },
            )
        };

        if result.is_ok() {
            if slot.is_null() {
                session.state.remove(&entry.name);
            } else {
                session.state.insert(entry.name.clone(), slot);
            }
        }
        result
    }
}

/// Join non-empty fragments, each preceded by its layer's separator.
fn compose(fragments: &[(&str, String)]) -> String {
    let mut text = String::new();
    for (separator, fragment) in fragments {
        if fragment.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str(separator);
        }
        text.push_str(fragment);
    }
    text
}

fn duration_us(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
