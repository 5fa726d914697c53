//! Ordered registry of extensions.
//!
//! The registry is filled while the schema is configured and is read-only
//! afterwards, so one registry can serve many concurrent queries without
//! locking.
//!
//! Every call into extension code goes through [`invoke`], so each
//! extension's hooks are guarded independently: a fault in one never stops
//! the next from running.

use core::fmt;
use std::sync::Arc;

use periscope_context::Context;
use serde_json::Map;

use super::{Phase, Stage, invoke};
use crate::error::PhaseError;
use crate::extension::Extension;
use crate::request::Request;
use crate::response::ResultMap;

const UNNAMED: &str = "<unnamed>";

// ─────────────────────────────────────────────────────────────────────────────
// RegisteredExtension
// ─────────────────────────────────────────────────────────────────────────────

/// Registry entry. The name is read once, at registration.
#[derive(Clone)]
struct RegisteredExtension {
    name: Arc<str>,
    extension: Arc<dyn Extension>,
}

// ─────────────────────────────────────────────────────────────────────────────
// StageStart / PendingFinishes
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of fanning a DidStart hook out over every extension.
pub struct StageStart<F> {
    /// Context after every successful hook, threaded in registration order.
    pub context: Context,
    /// Finish functions awaiting the stage's outcome.
    pub pending: PendingFinishes<F>,
    /// Faults recovered from the hooks, in registration order.
    pub errors: Vec<PhaseError>,
}

/// Finish functions returned by a stage's DidStart hooks.
///
/// Extensions whose DidStart faulted have no entry.
pub struct PendingFinishes<F> {
    stage: Stage,
    entries: Vec<(Arc<str>, F)>,
}

impl<F> PendingFinishes<F> {
    /// Returns the number of finish functions waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no finish function is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs every finish function in registration order.
    ///
    /// `call` applies one finish function to the stage's outcome; each call
    /// is guarded separately and attributed to the stage's finish phase.
    pub fn finish_all(self, mut call: impl FnMut(F)) -> Vec<PhaseError> {
        let phase = self.stage.finish();
        self.entries
            .into_iter()
            .filter_map(|(name, finish)| invoke(&name, phase, || call(finish)).err())
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExtensionRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// The ordered set of extensions attached to a schema.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    entries: Vec<RegisteredExtension>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an extension. Registration order is invocation order.
    pub fn register(&mut self, extension: impl Extension) {
        self.register_shared(Arc::new(extension));
    }

    /// Appends an extension that is shared with other owners.
    pub fn register_shared(&mut self, extension: Arc<dyn Extension>) {
        let name: Arc<str> = match invoke(UNNAMED, Phase::Init, || extension.name().to_owned()) {
            Ok(name) => name.into(),
            Err(_) => UNNAMED.into(),
        };
        tracing::debug!(extension = %name, "registered extension");
        self.entries.push(RegisteredExtension { name, extension });
    }

    /// Returns the number of registered extensions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no extension is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns extension names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_ref())
    }

    /// Runs every `init` hook, threading the context left to right.
    ///
    /// A faulting extension contributes no context change.
    pub fn init(&self, ctx: &Context, request: &Request) -> (Context, Vec<PhaseError>) {
        let mut ctx = ctx.clone();
        let mut errors = Vec::new();
        for entry in &self.entries {
            match invoke(&entry.name, Phase::Init, || entry.extension.init(&ctx, request)) {
                Ok(next) => ctx = next,
                Err(err) => errors.push(err),
            }
        }
        (ctx, errors)
    }

    /// Runs one DidStart hook per extension, threading the context.
    ///
    /// The context returned by extension *i* is the input of extension
    /// *i + 1*. `hook` selects the DidStart method to call.
    pub fn did_start<F>(
        &self,
        stage: Stage,
        ctx: &Context,
        mut hook: impl FnMut(&dyn Extension, &Context) -> (Context, F),
    ) -> StageStart<F> {
        let phase = stage.did_start();
        let mut context = ctx.clone();
        let mut entries = Vec::with_capacity(self.entries.len());
        let mut errors = Vec::new();

        for entry in &self.entries {
            match invoke(&entry.name, phase, || hook(entry.extension.as_ref(), &context)) {
                Ok((next, finish)) => {
                    context = next;
                    entries.push((entry.name.clone(), finish));
                }
                Err(err) => errors.push(err),
            }
        }

        StageStart {
            context,
            pending: PendingFinishes { stage, entries },
            errors,
        }
    }

    /// Collects result payloads from extensions that report one.
    ///
    /// The map exists as soon as one extension reports a result, even if
    /// its [`get_result`](Extension::get_result) then faults. With no
    /// result-bearing extension the map is `None`. Duplicate names keep the
    /// last payload.
    pub fn results(&self, ctx: &Context) -> (Option<ResultMap>, Vec<PhaseError>) {
        let mut results: Option<ResultMap> = None;
        let mut errors = Vec::new();

        for entry in &self.entries {
            let outcome = invoke(&entry.name, Phase::GetResult, || {
                if !entry.extension.has_result() {
                    return;
                }
                let map = results.get_or_insert_with(Map::new);
                let payload = entry.extension.get_result(ctx);
                map.insert(entry.name.to_string(), payload);
            });
            if let Err(err) = outcome {
                errors.push(err);
            }
        }
        (results, errors)
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
