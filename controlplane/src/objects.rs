//! Custom resources this controller owns that aren't part of the upstream
//! Gateway API: the NGINX-specific parameters object and the two policy
//! kinds the policy engine (`crate::graph::policy`) knows how to attach.
//!
//! Modeled the same way the sibling Gateway API CRDs in this ecosystem are:
//! a `kube::CustomResource` derive producing the `Spec` type plus a
//! generated `<Kind>` wrapper with `metadata`/`spec`/`status`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::graph::policy::{PolicyObject, PolicyStatus, PolicyTargetRef};

/// Parameters referenced by a GatewayClass or Gateway's `parametersRef`,
/// merged per-Gateway into an `EffectiveNginxProxy` (§4.5 step 3).
#[derive(Clone, Debug, Default, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gateway.nginx.org",
    version = "v1alpha1",
    kind = "NginxProxy",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct NginxProxySpec {
    #[serde(default)]
    pub disable_http2: bool,
    #[serde(default)]
    pub telemetry: Option<NginxProxyTelemetry>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NginxProxyTelemetry {
    pub service_name: Option<String>,
    pub exporter_endpoint: Option<String>,
}

/// The merge of class-level and gateway-level `NginxProxy` parameters for a
/// single Gateway, gateway-level winning field-by-field (§4.5, Glossary
/// "Effective NginxProxy").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectiveNginxProxy {
    pub disable_http2: bool,
    pub telemetry: Option<NginxProxyTelemetry>,
}

impl EffectiveNginxProxy {
    pub fn merge(class_level: Option<&NginxProxySpec>, gateway_level: Option<&NginxProxySpec>) -> Self {
        let mut effective = Self::default();
        if let Some(class) = class_level {
            effective.disable_http2 = class.disable_http2;
            effective.telemetry.clone_from(&class.telemetry);
        }
        if let Some(gw) = gateway_level {
            effective.disable_http2 = gw.disable_http2;
            if gw.telemetry.is_some() {
                effective.telemetry.clone_from(&gw.telemetry);
            }
        }
        effective
    }
}

/// Opaque, uninterpreted NGINX config snippet attached to a listener or
/// route. The core only validates existence; rendering its contents is out
/// of scope.
#[derive(Clone, Debug, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gateway.nginx.org",
    version = "v1alpha1",
    kind = "SnippetsFilter",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SnippetsFilterSpec {
    pub snippets: Vec<Snippet>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub context: String,
    pub value: String,
}

/// Per-Gateway/per-route client connection tuning.
#[derive(Clone, Debug, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gateway.nginx.org",
    version = "v1alpha1",
    kind = "ClientSettingsPolicy",
    namespaced,
    status = "PolicyStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettingsPolicySpec {
    pub target_refs: Vec<PolicyTargetRef>,
    #[serde(default)]
    pub body_max_size_bytes: u64,
    #[serde(default)]
    pub keepalive_timeout_seconds: u32,
}

impl PolicyObject for ClientSettingsPolicy {
    fn kind_name() -> &'static str {
        "ClientSettingsPolicy"
    }

    fn target_refs(&self) -> &[PolicyTargetRef] {
        &self.spec.target_refs
    }

    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    fn creation_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.metadata.creation_timestamp.as_ref().map(|t| t.0)
    }
}

/// Per-Gateway/per-route tracing toggle.
#[derive(Clone, Debug, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gateway.nginx.org",
    version = "v1alpha1",
    kind = "ObservabilityPolicy",
    namespaced,
    status = "PolicyStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ObservabilityPolicySpec {
    pub target_refs: Vec<PolicyTargetRef>,
    #[serde(default)]
    pub tracing_enabled: bool,
    #[serde(default)]
    pub sampling_rate_percent: u8,
}

impl PolicyObject for ObservabilityPolicy {
    fn kind_name() -> &'static str {
        "ObservabilityPolicy"
    }

    fn target_refs(&self) -> &[PolicyTargetRef] {
        &self.spec.target_refs
    }

    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    fn creation_timestamp(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.metadata.creation_timestamp.as_ref().map(|t| t.0)
    }
}
