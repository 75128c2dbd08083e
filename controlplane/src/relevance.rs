//! Tracks which namespaced objects are currently reachable from the graph,
//! so the change processor can skip a full rebuild when a change touches an
//! object nobody references (§4.2, Glossary "Relevance").

use ahash::{AHashMap, AHashSet};

use crate::kinds::ResourceKind;
use crate::types::NsName;

/// Snapshot of "what does the graph currently depend on", rebuilt at the end
/// of every successful graph build and consulted before the next one to
/// decide whether an incoming change can be ignored outright.
#[derive(Default)]
pub struct RelevanceTracker {
    relevant: AHashMap<ResourceKind, AHashSet<NsName>>,
}

impl RelevanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kinds that are always relevant regardless of reachability (§4.2):
    /// every GatewayClass, Gateway, route, ReferenceGrant, NginxProxy,
    /// SnippetsFilter and policy object is a potential root of the graph, so
    /// their relevance can't be computed from a previous build alone.
    /// `GatewayApiCrd` is here too, but for a different reason: `watch::apply`
    /// only ever surfaces a `GatewayApiCrd` tuple once it has already checked
    /// the bundle-version annotation actually changed, so by the time this
    /// kind reaches the tracker at all, it's always worth a rebuild.
    fn always_relevant(kind: ResourceKind) -> bool {
        matches!(
            kind,
            ResourceKind::GatewayClass
                | ResourceKind::Gateway
                | ResourceKind::HttpRoute
                | ResourceKind::GrpcRoute
                | ResourceKind::TlsRoute
                | ResourceKind::ReferenceGrant
                | ResourceKind::NginxProxy
                | ResourceKind::SnippetsFilter
                | ResourceKind::ClientSettingsPolicy
                | ResourceKind::ObservabilityPolicy
                | ResourceKind::BackendTlsPolicy
                | ResourceKind::GatewayApiCrd
        )
    }

    pub fn is_relevant(&self, kind: ResourceKind, ns_name: &NsName) -> bool {
        if Self::always_relevant(kind) {
            return true;
        }
        self.relevant.get(&kind).is_some_and(|set| set.contains(ns_name))
    }

    pub fn mark(&mut self, kind: ResourceKind, ns_name: NsName) {
        self.relevant.entry(kind).or_default().insert(ns_name);
    }

    /// Replaces the relevance set for one kind wholesale, called once per
    /// kind at the end of a successful graph build.
    pub fn replace(&mut self, kind: ResourceKind, ns_names: impl IntoIterator<Item = NsName>) {
        self.relevant.insert(kind, ns_names.into_iter().collect());
    }

    pub fn clear(&mut self, kind: ResourceKind) {
        self.relevant.remove(&kind);
    }
}
