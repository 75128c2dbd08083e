//! `ChangeProcessor`: the façade the binary drives (§4.7). Wraps the object
//! store, relevance tracker, and graph builder behind the single
//! `capture_upsert`/`capture_delete`/`process` surface the rest of the crate
//! is organized around, the same way the teacher's `Context` bundles what a
//! reconciler needs behind one struct.
//!
//! The dirty bit and the last-published graph are this struct's own fields,
//! not the caller's: a batch of captures that touches nothing relevant never
//! sets the bit, and `process` only rebuilds when it's set.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::graph::{Graph, GraphBuilder};
use crate::kinds::ResourceKind;
use crate::relevance::RelevanceTracker;
use crate::store::ObjectStore;
use crate::types::NsName;
use crate::validation::Validators;

pub struct ChangeProcessor {
    store: ObjectStore,
    relevance: RelevanceTracker,
    validators: Validators,
    dirty: bool,
    published: Arc<RwLock<Option<Arc<Graph>>>>,
}

impl ChangeProcessor {
    pub fn new(validators: Validators) -> Self {
        Self {
            store: ObjectStore::default(),
            relevance: RelevanceTracker::new(),
            validators,
            dirty: false,
            published: Arc::new(RwLock::new(None)),
        }
    }

    /// A cheaply-cloneable handle onto the most recently published graph,
    /// safe to hand to a dataplane-rendering task running on another thread
    /// (§5, "Publication"). `None` until the first successful `process`.
    pub fn graph_handle(&self) -> Arc<RwLock<Option<Arc<Graph>>>> {
        Arc::clone(&self.published)
    }

    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// Mutates the store via `apply` and, if any of the `(kind, name)` pairs
    /// it returns is currently relevant to the graph (§4.2), sets the dirty
    /// bit. Used for both upserts and deletes: `apply` itself (built from
    /// `watch::apply`) already knows which of the two it's doing, so both
    /// entry points fold into the same store-mutation-plus-relevance-check.
    fn capture(&mut self, apply: impl FnOnce(&mut ObjectStore) -> Vec<(ResourceKind, NsName)>) {
        let touched = apply(&mut self.store);
        if touched.into_iter().any(|(kind, ns_name)| self.relevance.is_relevant(kind, &ns_name)) {
            self.dirty = true;
        }
    }

    /// Captures an upsert (§4.7 `capture_upsert`).
    pub fn capture_upsert(&mut self, apply: impl FnOnce(&mut ObjectStore) -> Vec<(ResourceKind, NsName)>) {
        self.capture(apply);
    }

    /// Captures a delete (§4.7 `capture_delete`).
    pub fn capture_delete(&mut self, apply: impl FnOnce(&mut ObjectStore) -> Vec<(ResourceKind, NsName)>) {
        self.capture(apply);
    }

    /// If the dirty bit is set, rebuilds the graph from the current store
    /// contents, publishes it, clears the bit, and returns it. Otherwise
    /// returns `None` without touching the store or the published graph
    /// (§4.7, §8 P1-P3). Building is synchronous and allocation-bound; this
    /// crate never performs I/O mid-build.
    pub fn process(&mut self) -> Option<Arc<Graph>> {
        if !self.dirty {
            return None;
        }

        let graph = GraphBuilder::new(&self.store, &self.validators).build();

        self.relevance.replace(ResourceKind::Service, graph.referenced_services.keys().cloned());
        self.relevance.replace(ResourceKind::Secret, graph.referenced_secrets.iter().cloned());

        let graph = Arc::new(graph);
        *self.published.write() = Some(Arc::clone(&graph));
        self.dirty = false;
        Some(graph)
    }

    /// The last graph `process` published, independent of whether the most
    /// recent `process` call itself returned `Some` (§4.7 `latest_graph`).
    pub fn latest_graph(&self) -> Option<Arc<Graph>> {
        self.published.read().clone()
    }
}
