//! The policy attachment engine (§4.6): ingest, validate, resolve conflicts,
//! attach to ancestors, and stamp "Affected" status onto targets.

use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::consts::{condition, MAX_POLICY_ANCESTORS};
use crate::gvk::{GvkExtractor, GATEWAY_GROUP};
use crate::objects::{ClientSettingsPolicy, EffectiveNginxProxy, ObservabilityPolicy};
use crate::types::{Condition, L4RouteKey, NsName, RouteKey, RouteKind};

/// A target reference as it appears on the wire (the CRD spec field).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTargetRef {
    pub group: String,
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub section_name: Option<String>,
}

impl GvkExtractor for PolicyTargetRef {
    fn group(&self) -> &str {
        &self.group
    }

    fn kind(&self) -> &str {
        &self.kind
    }
}

/// Status type shared by every policy kind's `status` subresource.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyStatus {
    #[serde(default)]
    pub ancestors: Vec<PolicyAncestorStatus>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAncestorStatus {
    pub ancestor_ref: PolicyTargetRef,
    pub controller_name: String,
    pub conditions: Vec<StatusCondition>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    pub reason: String,
    pub message: String,
}

/// Capability a concrete policy kind (`ClientSettingsPolicy`,
/// `ObservabilityPolicy`, ...) must expose to be processed by the engine,
/// independent of its CRD-specific spec shape.
pub trait PolicyObject {
    fn kind_name() -> &'static str;
    fn target_refs(&self) -> &[PolicyTargetRef];
    fn name(&self) -> &str;
    fn namespace(&self) -> &str;
    fn creation_timestamp(&self) -> Option<DateTime<Utc>>;

    fn ns_name(&self) -> NsName {
        NsName::new(self.namespace(), self.name())
    }
}

/// A resolved target a policy attached (or failed to attach) to.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum TargetRef {
    Gateway(NsName),
    HttpRoute(RouteKey),
    GrpcRoute(RouteKey),
    TlsRoute(L4RouteKey),
    Service(NsName),
}

/// Per-ancestor attachment record, capped at `MAX_POLICY_ANCESTORS` (I5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyAncestor {
    pub ancestor_ref: TargetRef,
    pub controller_name: String,
    pub conditions: Vec<Condition>,
}

/// Engine-internal, type-erased view of one policy instance as it moves
/// through phases P1-P4.
#[derive(Clone, Debug)]
pub struct Policy {
    pub kind: &'static str,
    pub ns_name: NsName,
    pub target_refs: Vec<PolicyTargetRef>,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub valid: bool,
    pub conditions: Vec<Condition>,
    pub ancestors: Vec<PolicyAncestor>,
    pub invalid_for_gateways: AHashMap<NsName, Condition>,
}

/// The subset of Graph state the policy engine needs: which Gateways exist
/// and whether they're valid, which routes exist and are attachable, and
/// which Services are referenced by which Gateways.
pub struct AttachmentContext<'a> {
    pub controller_name: &'a str,
    pub gateways: &'a AHashMap<NsName, GatewayView>,
    pub routes: &'a AHashMap<RouteKey, RouteView>,
    pub referenced_services: &'a AHashMap<NsName, AHashSet<NsName>>,
}

pub struct GatewayView {
    pub valid: bool,
    pub effective_nginx_proxy: EffectiveNginxProxy,
}

pub struct RouteView {
    pub valid: bool,
    pub attached_gateways: Vec<NsName>,
    /// (listener key, accepted hostname, path value) triples this route
    /// occupies, used for the overlap-conflict check.
    pub occupied_triples: AHashSet<(crate::types::ListenerKey, String, String)>,
}

/// Kind-specific behavior a policy validator must provide (§4.6 P2/P3).
trait PolicyValidator {
    type Spec;

    fn validate(spec: &Self::Spec) -> Result<(), Condition>;
    fn validate_global_settings(spec: &Self::Spec, effective: &EffectiveNginxProxy) -> Result<(), Condition>;
    /// Whether two instances targeting the same object conflict.
    fn conflicts(a: &Self::Spec, b: &Self::Spec) -> bool;
}

struct ClientSettingsValidator;

impl PolicyValidator for ClientSettingsValidator {
    type Spec = crate::objects::ClientSettingsPolicySpec;

    fn validate(spec: &Self::Spec) -> Result<(), Condition> {
        if spec.body_max_size_bytes == 0 {
            return Err(Condition::false_(
                condition::ACCEPTED,
                "Invalid",
                "bodyMaxSizeBytes must be greater than zero",
            ));
        }
        Ok(())
    }

    fn validate_global_settings(_spec: &Self::Spec, _effective: &EffectiveNginxProxy) -> Result<(), Condition> {
        Ok(())
    }

    fn conflicts(_a: &Self::Spec, _b: &Self::Spec) -> bool {
        // Only one ClientSettingsPolicy may apply to a given object.
        true
    }
}

struct ObservabilityValidator;

impl PolicyValidator for ObservabilityValidator {
    type Spec = crate::objects::ObservabilityPolicySpec;

    fn validate(spec: &Self::Spec) -> Result<(), Condition> {
        if spec.sampling_rate_percent > 100 {
            return Err(Condition::false_(
                condition::ACCEPTED,
                "Invalid",
                "samplingRatePercent must be between 0 and 100",
            ));
        }
        Ok(())
    }

    fn validate_global_settings(spec: &Self::Spec, effective: &EffectiveNginxProxy) -> Result<(), Condition> {
        if spec.tracing_enabled
            && effective
                .telemetry
                .as_ref()
                .and_then(|t| t.exporter_endpoint.as_ref())
                .is_none()
        {
            return Err(Condition::false_(
                condition::ACCEPTED,
                condition::REASON_POLICY_NOT_ACCEPTED_NGINX_PROXY_NOT_SET,
                "tracing requires an NginxProxy telemetry exporter endpoint",
            ));
        }
        Ok(())
    }

    fn conflicts(_a: &Self::Spec, _b: &Self::Spec) -> bool {
        true
    }
}

/// Runs P1-P4 over every ingested policy and returns the processed set plus
/// the "Affected" conditions to stamp onto targets.
pub struct PolicyEngine;

#[derive(Default)]
pub struct PolicyEngineOutput {
    pub policies: Vec<Policy>,
    /// Target -> policy kinds that accepted-attached to it, used to stamp
    /// "Affected" conditions on the target object's own status.
    pub affected: AHashMap<TargetRef, AHashSet<&'static str>>,
}

impl PolicyEngine {
    pub fn process(
        client_settings: Vec<ClientSettingsPolicy>,
        observability: Vec<ObservabilityPolicy>,
        ctx: &AttachmentContext<'_>,
    ) -> PolicyEngineOutput {
        let mut cs: Vec<(Policy, crate::objects::ClientSettingsPolicySpec)> = client_settings
            .into_iter()
            .map(|p| {
                let policy = new_policy(&p);
                (policy, p.spec)
            })
            .collect();
        let mut obs: Vec<(Policy, crate::objects::ObservabilityPolicySpec)> = observability
            .into_iter()
            .map(|p| {
                let policy = new_policy(&p);
                (policy, p.spec)
            })
            .collect();

        for (policy, spec) in cs.iter_mut() {
            validate_one::<ClientSettingsValidator>(policy, spec, ctx);
        }
        for (policy, spec) in obs.iter_mut() {
            validate_one::<ObservabilityValidator>(policy, spec, ctx);
        }

        resolve_conflicts::<ClientSettingsValidator>(&mut cs);
        resolve_conflicts::<ObservabilityValidator>(&mut obs);

        let mut affected: AHashMap<TargetRef, AHashSet<&'static str>> = AHashMap::new();
        let mut policies: Vec<Policy> = Vec::with_capacity(cs.len() + obs.len());
        for (mut policy, _) in cs {
            attach(&mut policy, ctx, &mut affected);
            policies.push(policy);
        }
        for (mut policy, _) in obs {
            attach(&mut policy, ctx, &mut affected);
            policies.push(policy);
        }

        PolicyEngineOutput { policies, affected }
    }
}

fn new_policy<P: PolicyObject>(p: &P) -> Policy {
    Policy {
        kind: P::kind_name(),
        ns_name: p.ns_name(),
        target_refs: p.target_refs().to_vec(),
        creation_timestamp: p.creation_timestamp(),
        valid: true,
        conditions: Vec::new(),
        ancestors: Vec::new(),
        invalid_for_gateways: AHashMap::new(),
    }
}

fn validate_one<V: PolicyValidator>(policy: &mut Policy, spec: &V::Spec, ctx: &AttachmentContext<'_>) {
    if let Err(cond) = V::validate(spec) {
        policy.valid = false;
        policy.conditions.push(cond);
        return;
    }
    for target in &policy.target_refs {
        if target.kind != "Gateway" {
            continue;
        }
        let gw_name = NsName::new(target.namespace.clone().unwrap_or_default(), target.name.clone());
        if let Some(gw) = ctx.gateways.get(&gw_name) {
            if let Err(cond) = V::validate_global_settings(spec, &gw.effective_nginx_proxy) {
                policy.invalid_for_gateways.insert(gw_name, cond);
            }
        }
    }
}

/// §4.6 P3: among valid same-kind policies sharing a target, only the
/// oldest (by `creationTimestamp`, ties broken by namespaced name) stays
/// `valid`; the rest are marked conflicted.
fn resolve_conflicts<V: PolicyValidator>(items: &mut [(Policy, V::Spec)]) {
    let n = items.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (left, right) = items.split_at_mut(j);
            let (policy_a, spec_a) = &mut left[i];
            let (policy_b, spec_b) = &mut right[0];
            if !policy_a.valid || !policy_b.valid {
                continue;
            }
            if !same_target(&policy_a.target_refs, &policy_b.target_refs) {
                continue;
            }
            if !V::conflicts(spec_a, spec_b) {
                continue;
            }
            let loser = pick_conflict_loser(policy_a, policy_b);
            loser.valid = false;
            let kind = loser.kind;
            loser.conditions.push(Condition::false_(
                condition::ACCEPTED,
                condition::REASON_POLICY_CONFLICTED,
                format!("conflicts with another {kind} targeting the same object"),
            ));
        }
    }
}

fn same_target(a: &[PolicyTargetRef], b: &[PolicyTargetRef]) -> bool {
    a.iter().any(|ra| {
        b.iter()
            .any(|rb| ra.kind == rb.kind && ra.name == rb.name && ra.namespace == rb.namespace)
    })
}

/// Older `creationTimestamp` wins; ties broken lexicographically by
/// namespaced name (§9 Open Question (b)). Returns the *loser*.
fn pick_conflict_loser<'p>(a: &'p mut Policy, b: &'p mut Policy) -> &'p mut Policy {
    match (a.creation_timestamp, b.creation_timestamp) {
        (Some(ta), Some(tb)) if ta != tb => {
            if ta < tb {
                b
            } else {
                a
            }
        }
        _ => {
            if a.ns_name <= b.ns_name {
                b
            } else {
                a
            }
        }
    }
}

fn attach(policy: &mut Policy, ctx: &AttachmentContext<'_>, affected: &mut AHashMap<TargetRef, AHashSet<&'static str>>) {
    if !policy.valid {
        return;
    }
    let mut seen_gateway_ancestors: AHashSet<NsName> = AHashSet::new();

    for target in policy.target_refs.clone() {
        if policy.ancestors.len() >= MAX_POLICY_ANCESTORS {
            break;
        }
        match target.kind.as_str() {
            "Gateway" => attach_gateway(policy, &target, ctx, affected),
            "HTTPRoute" | "GRPCRoute" => attach_route(policy, &target, ctx, affected),
            "Service" => attach_service(policy, &target, ctx, affected, &mut seen_gateway_ancestors),
            other => {
                policy.ancestors.push(PolicyAncestor {
                    ancestor_ref: TargetRef::Service(NsName::new(
                        target.namespace.clone().unwrap_or_default(),
                        target.name.clone(),
                    )),
                    controller_name: ctx.controller_name.to_string(),
                    conditions: vec![Condition::false_(
                        condition::ACCEPTED,
                        condition::REASON_TARGET_INVALID,
                        format!("unsupported target kind {other}"),
                    )],
                });
            }
        }
    }
}

fn attach_gateway(
    policy: &mut Policy,
    target: &PolicyTargetRef,
    ctx: &AttachmentContext<'_>,
    affected: &mut AHashMap<TargetRef, AHashSet<&'static str>>,
) {
    let ns_name = NsName::new(target.namespace.clone().unwrap_or_default(), target.name.clone());
    if target.group() != GATEWAY_GROUP {
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: TargetRef::Gateway(ns_name),
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_TARGET_NOT_FOUND,
                "TargetRef is not found",
            )],
        });
        return;
    }
    let Some(gw) = ctx.gateways.get(&ns_name) else {
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: TargetRef::Gateway(ns_name),
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_TARGET_NOT_FOUND,
                "TargetRef is not found",
            )],
        });
        return;
    };
    let conditions = if !gw.valid || policy.invalid_for_gateways.contains_key(&ns_name) {
        vec![Condition::false_(
            condition::ACCEPTED,
            condition::REASON_TARGET_INVALID,
            "TargetRef is invalid",
        )]
    } else {
        affected
            .entry(TargetRef::Gateway(ns_name.clone()))
            .or_default()
            .insert(policy.kind);
        vec![Condition::true_(condition::ACCEPTED, condition::REASON_ACCEPTED, "")]
    };
    policy.ancestors.push(PolicyAncestor {
        ancestor_ref: TargetRef::Gateway(ns_name),
        controller_name: ctx.controller_name.to_string(),
        conditions,
    });
}

fn attach_route(
    policy: &mut Policy,
    target: &PolicyTargetRef,
    ctx: &AttachmentContext<'_>,
    affected: &mut AHashMap<TargetRef, AHashSet<&'static str>>,
) {
    let ns_name = NsName::new(target.namespace.clone().unwrap_or_default(), target.name.clone());
    if target.group() != GATEWAY_GROUP {
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: TargetRef::Service(ns_name),
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_TARGET_NOT_FOUND,
                "TargetRef is not found",
            )],
        });
        return;
    }
    let key = ctx
        .routes
        .keys()
        .find(|k| k.name == ns_name && route_kind_matches(k, &target.kind))
        .cloned();

    let Some(key) = key else {
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: TargetRef::Service(ns_name),
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_TARGET_NOT_FOUND,
                "TargetRef is not found",
            )],
        });
        return;
    };
    let route = &ctx.routes[&key];
    let target_ref = route_target_ref(&key);

    if !route.valid || route.attached_gateways.is_empty() {
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: target_ref,
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_TARGET_INVALID,
                "TargetRef is invalid",
            )],
        });
        return;
    }

    if overlap_conflict(policy, &key, route, ctx) {
        policy.valid = false;
        policy.conditions.push(Condition::false_(
            condition::ACCEPTED,
            condition::REASON_TARGET_CONFLICT,
            "TargetRefs overlap with another route not also targeted by this policy",
        ));
        return;
    }

    let invalid_on_parent = route.attached_gateways.iter().any(|gw| policy.invalid_for_gateways.contains_key(gw));
    let conditions = if invalid_on_parent {
        vec![Condition::false_(
            condition::ACCEPTED,
            condition::REASON_TARGET_INVALID,
            "TargetRef is invalid for one or more parent Gateways",
        )]
    } else {
        affected.entry(target_ref.clone()).or_default().insert(policy.kind);
        vec![Condition::true_(condition::ACCEPTED, condition::REASON_ACCEPTED, "")]
    };
    policy.ancestors.push(PolicyAncestor {
        ancestor_ref: target_ref,
        controller_name: ctx.controller_name.to_string(),
        conditions,
    });
}

fn route_kind_matches(key: &RouteKey, wire_kind: &str) -> bool {
    matches!(
        (key.kind, wire_kind),
        (RouteKind::Http, "HTTPRoute") | (RouteKind::Grpc, "GRPCRoute")
    )
}

fn route_target_ref(key: &RouteKey) -> TargetRef {
    match key.kind {
        RouteKind::Http => TargetRef::HttpRoute(key.clone()),
        RouteKind::Grpc => TargetRef::GrpcRoute(key.clone()),
    }
}

/// §4.6 "Overlap conflict for route-targeted policies": a policy that
/// targets a route whose accepted hostname/path space overlaps another
/// route it does *not* also target is rejected outright.
fn overlap_conflict(policy: &Policy, own_key: &RouteKey, own_route: &RouteView, ctx: &AttachmentContext<'_>) -> bool {
    let targeted_routes: AHashSet<&str> = policy
        .target_refs
        .iter()
        .filter(|t| t.kind == "HTTPRoute" || t.kind == "GRPCRoute")
        .map(|t| t.name.as_str())
        .collect();

    for (other_key, other_route) in ctx.routes {
        if other_key == own_key {
            continue;
        }
        let overlaps = own_route
            .occupied_triples
            .iter()
            .any(|t| other_route.occupied_triples.contains(t));
        if overlaps && !targeted_routes.contains(other_key.name.name.as_str()) {
            return true;
        }
    }
    false
}

fn attach_service(
    policy: &mut Policy,
    target: &PolicyTargetRef,
    ctx: &AttachmentContext<'_>,
    affected: &mut AHashMap<TargetRef, AHashSet<&'static str>>,
    seen_gateway_ancestors: &mut AHashSet<NsName>,
) {
    let ns_name = NsName::new(target.namespace.clone().unwrap_or_default(), target.name.clone());
    let Some(gateways) = ctx.referenced_services.get(&ns_name) else {
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: TargetRef::Service(ns_name),
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_TARGET_NOT_FOUND,
                "TargetRef is not found",
            )],
        });
        return;
    };

    affected
        .entry(TargetRef::Service(ns_name.clone()))
        .or_default()
        .insert(policy.kind);

    for gw_name in gateways {
        if policy.ancestors.len() >= MAX_POLICY_ANCESTORS {
            break;
        }
        let Some(gw) = ctx.gateways.get(gw_name) else {
            continue;
        };
        if !gw.valid || !seen_gateway_ancestors.insert(gw_name.clone()) {
            continue;
        }
        policy.ancestors.push(PolicyAncestor {
            ancestor_ref: TargetRef::Gateway(gw_name.clone()),
            controller_name: ctx.controller_name.to_string(),
            conditions: vec![Condition::true_(condition::ACCEPTED, condition::REASON_ACCEPTED, "")],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ClientSettingsPolicySpec;

    fn target(kind: &str, name: &str) -> PolicyTargetRef {
        PolicyTargetRef {
            group: "gateway.networking.k8s.io".to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: Some("default".to_string()),
            section_name: None,
        }
    }

    #[test]
    fn gateway_target_not_found_is_reflected_in_ancestor_condition() {
        let gateways: AHashMap<NsName, GatewayView> = AHashMap::new();
        let routes: AHashMap<RouteKey, RouteView> = AHashMap::new();
        let referenced_services: AHashMap<NsName, AHashSet<NsName>> = AHashMap::new();
        let ctx = AttachmentContext {
            controller_name: "my.controller",
            gateways: &gateways,
            routes: &routes,
            referenced_services: &referenced_services,
        };

        let mut policy = Policy {
            kind: "ClientSettingsPolicy",
            ns_name: NsName::new("default", "csp"),
            target_refs: vec![target("Gateway", "missing-gw")],
            creation_timestamp: None,
            valid: true,
            conditions: Vec::new(),
            ancestors: Vec::new(),
            invalid_for_gateways: AHashMap::new(),
        };
        let mut affected = AHashMap::new();
        attach(&mut policy, &ctx, &mut affected);

        assert_eq!(policy.ancestors.len(), 1);
        assert_eq!(policy.ancestors[0].conditions[0].reason, condition::REASON_TARGET_NOT_FOUND);
        assert!(affected.is_empty());
    }

    #[test]
    fn older_policy_wins_conflict_resolution() {
        use chrono::TimeZone;
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let spec = ClientSettingsPolicySpec {
            target_refs: vec![target("Gateway", "gw-1")],
            body_max_size_bytes: 1024,
            keepalive_timeout_seconds: 30,
        };

        let mut items = vec![
            (
                Policy {
                    kind: "ClientSettingsPolicy",
                    ns_name: NsName::new("default", "old"),
                    target_refs: spec.target_refs.clone(),
                    creation_timestamp: Some(older),
                    valid: true,
                    conditions: Vec::new(),
                    ancestors: Vec::new(),
                    invalid_for_gateways: AHashMap::new(),
                },
                spec.clone(),
            ),
            (
                Policy {
                    kind: "ClientSettingsPolicy",
                    ns_name: NsName::new("default", "new"),
                    target_refs: spec.target_refs.clone(),
                    creation_timestamp: Some(newer),
                    valid: true,
                    conditions: Vec::new(),
                    ancestors: Vec::new(),
                    invalid_for_gateways: AHashMap::new(),
                },
                spec,
            ),
        ];

        resolve_conflicts::<ClientSettingsValidator>(&mut items);

        assert!(items[0].0.valid);
        assert!(!items[1].0.valid);
    }

    #[test]
    fn ancestor_list_is_capped_at_sixteen() {
        let mut gateways: AHashMap<NsName, GatewayView> = AHashMap::new();
        let mut target_refs = Vec::new();
        for i in 0..(MAX_POLICY_ANCESTORS + 1) {
            let name = format!("gw-{i}");
            gateways.insert(
                NsName::new("default", &name),
                GatewayView {
                    valid: true,
                    effective_nginx_proxy: EffectiveNginxProxy::default(),
                },
            );
            target_refs.push(target("Gateway", &name));
        }
        let routes: AHashMap<RouteKey, RouteView> = AHashMap::new();
        let referenced_services: AHashMap<NsName, AHashSet<NsName>> = AHashMap::new();
        let ctx = AttachmentContext {
            controller_name: "my.controller",
            gateways: &gateways,
            routes: &routes,
            referenced_services: &referenced_services,
        };

        let mut policy = Policy {
            kind: "ClientSettingsPolicy",
            ns_name: NsName::new("default", "csp"),
            target_refs,
            creation_timestamp: None,
            valid: true,
            conditions: Vec::new(),
            ancestors: Vec::new(),
            invalid_for_gateways: AHashMap::new(),
        };
        let mut affected = AHashMap::new();
        attach(&mut policy, &ctx, &mut affected);

        assert_eq!(policy.ancestors.len(), MAX_POLICY_ANCESTORS);
    }

    #[test]
    fn route_overlap_without_shared_target_conflicts() {
        let gateways: AHashMap<NsName, GatewayView> = AHashMap::new();
        let mut routes: AHashMap<RouteKey, RouteView> = AHashMap::new();
        let shared = (
            crate::types::ListenerKey {
                gateway: NsName::new("test", "gw1"),
                listener_name: "http".to_string(),
            },
            "cafe.example.com".to_string(),
            "/coffee".to_string(),
        );
        let coffee_key = RouteKey {
            kind: RouteKind::Http,
            name: NsName::new("default", "hr-coffee"),
        };
        let other_key = RouteKey {
            kind: RouteKind::Http,
            name: NsName::new("default", "hr2"),
        };
        routes.insert(
            coffee_key.clone(),
            RouteView {
                valid: true,
                attached_gateways: vec![NsName::new("test", "gw1")],
                occupied_triples: [shared.clone()].into_iter().collect(),
            },
        );
        routes.insert(
            other_key,
            RouteView {
                valid: true,
                attached_gateways: vec![NsName::new("test", "gw1")],
                occupied_triples: [shared].into_iter().collect(),
            },
        );
        let referenced_services: AHashMap<NsName, AHashSet<NsName>> = AHashMap::new();
        let ctx = AttachmentContext {
            controller_name: "my.controller",
            gateways: &gateways,
            routes: &routes,
            referenced_services: &referenced_services,
        };

        let mut policy = Policy {
            kind: "ClientSettingsPolicy",
            ns_name: NsName::new("test", "csp"),
            target_refs: vec![target("HTTPRoute", "hr-coffee")],
            creation_timestamp: None,
            valid: true,
            conditions: Vec::new(),
            ancestors: Vec::new(),
            invalid_for_gateways: AHashMap::new(),
        };
        let mut affected = AHashMap::new();
        attach(&mut policy, &ctx, &mut affected);

        assert!(!policy.valid);
        assert_eq!(policy.conditions[0].reason, condition::REASON_TARGET_CONFLICT);
    }

    #[test]
    fn route_overlap_covered_by_both_targets_is_not_a_conflict() {
        let gateways: AHashMap<NsName, GatewayView> = AHashMap::new();
        let mut routes: AHashMap<RouteKey, RouteView> = AHashMap::new();
        let shared = (
            crate::types::ListenerKey {
                gateway: NsName::new("test", "gw1"),
                listener_name: "http".to_string(),
            },
            "cafe.example.com".to_string(),
            "/coffee".to_string(),
        );
        let coffee_key = RouteKey {
            kind: RouteKind::Http,
            name: NsName::new("default", "hr-coffee"),
        };
        let other_key = RouteKey {
            kind: RouteKind::Http,
            name: NsName::new("default", "hr2"),
        };
        routes.insert(
            coffee_key,
            RouteView {
                valid: true,
                attached_gateways: vec![NsName::new("test", "gw1")],
                occupied_triples: [shared.clone()].into_iter().collect(),
            },
        );
        routes.insert(
            other_key,
            RouteView {
                valid: true,
                attached_gateways: vec![NsName::new("test", "gw1")],
                occupied_triples: [shared].into_iter().collect(),
            },
        );
        let referenced_services: AHashMap<NsName, AHashSet<NsName>> = AHashMap::new();
        let ctx = AttachmentContext {
            controller_name: "my.controller",
            gateways: &gateways,
            routes: &routes,
            referenced_services: &referenced_services,
        };

        let mut policy = Policy {
            kind: "ClientSettingsPolicy",
            ns_name: NsName::new("test", "csp"),
            target_refs: vec![target("HTTPRoute", "hr-coffee"), target("HTTPRoute", "hr2")],
            creation_timestamp: None,
            valid: true,
            conditions: Vec::new(),
            ancestors: Vec::new(),
            invalid_for_gateways: AHashMap::new(),
        };
        let mut affected = AHashMap::new();
        attach(&mut policy, &ctx, &mut affected);

        assert!(policy.valid);
    }
}
