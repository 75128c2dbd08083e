//! L7 (HTTPRoute/GRPCRoute) and L4 (TLSRoute) graph nodes, and the route
//! attacher that matches a route's `parentRefs` against Gateway listeners
//! (§4.4, Glossary "Route attachment").

use std::collections::BTreeMap;

use ahash::AHashSet;

pub use crate::types::{L4RouteKey, L4RouteKind, RouteKey, RouteKind};
use crate::consts::condition;
use crate::graph::gateway::{AllowedRouteNamespaces, Gateway};
use crate::types::{Condition, ListenerKey, NsName};

/// One `parentRefs[]` entry resolved against the Gateway/listener it names,
/// independent of whether the match ultimately succeeded.
#[derive(Clone, Debug)]
pub struct ParentRef {
    pub gateway: NsName,
    pub section_name: Option<String>,
    pub port: Option<u16>,
}

/// Per-(route, parent) attachment outcome. A route can be accepted by some
/// parents and rejected by others (I2).
#[derive(Clone, Debug)]
pub struct Attachment {
    pub listener_key: ListenerKey,
    pub accepted: bool,
    pub conditions: Vec<Condition>,
    /// Hostnames this route actually intersects with the listener on,
    /// empty when rejected. Used for policy overlap detection.
    pub accepted_hostnames: Vec<String>,
}

/// A single backend the route can forward to, post reference-resolution.
#[derive(Clone, Debug)]
pub struct BackendRef {
    pub service: NsName,
    pub port: u16,
    pub weight: i32,
    pub valid: bool,
    pub conditions: Vec<Condition>,
}

/// A rule's matches plus its resolved backends. Rendering the match
/// predicates themselves (paths/headers/methods) is out of scope (Non-goal);
/// only enough of the rule survives to compute listener/path overlap for the
/// policy engine.
#[derive(Clone, Debug, Default)]
pub struct RouteRule {
    pub path_values: Vec<String>,
    pub backend_refs: Vec<BackendRef>,
}

/// A validated (or partially-validated) HTTPRoute/GRPCRoute.
#[derive(Clone, Debug)]
pub struct Route {
    pub key: RouteKey,
    pub hostnames: Vec<String>,
    pub parent_refs: Vec<ParentRef>,
    pub rules: Vec<RouteRule>,
    pub valid: bool,
    pub conditions: Vec<Condition>,
    pub attachments: Vec<Attachment>,
}

impl Route {
    pub fn attached_gateways(&self) -> Vec<NsName> {
        self.parent_refs.iter().map(|p| p.gateway.clone()).collect()
    }

    pub fn is_attached(&self) -> bool {
        self.attachments.iter().any(|a| a.accepted)
    }

    /// (listener key, accepted hostname, path value) triples this route
    /// occupies, the unit the policy engine's overlap-conflict check
    /// compares across routes. The listener key carries the Gateway it
    /// belongs to, so two different Gateways' identically-named listeners
    /// never collide here.
    pub fn occupied_triples(&self) -> AHashSet<(ListenerKey, String, String)> {
        let mut triples = AHashSet::new();
        for attachment in &self.attachments {
            if !attachment.accepted {
                continue;
            }
            for hostname in &attachment.accepted_hostnames {
                for rule in &self.rules {
                    for path in &rule.path_values {
                        triples.insert((attachment.listener_key.clone(), hostname.clone(), path.clone()));
                    }
                    if rule.path_values.is_empty() {
                        triples.insert((attachment.listener_key.clone(), hostname.clone(), String::new()));
                    }
                }
            }
        }
        triples
    }
}

/// A validated TLSRoute, L4-only: no rule/backend matching beyond SNI, since
/// TLS passthrough has no HTTP semantics to inspect.
#[derive(Clone, Debug)]
pub struct L4Route {
    pub key: L4RouteKey,
    pub hostnames: Vec<String>,
    pub parent_refs: Vec<ParentRef>,
    pub backend_refs: Vec<BackendRef>,
    pub valid: bool,
    pub conditions: Vec<Condition>,
    pub attachments: Vec<Attachment>,
}

impl L4Route {
    pub fn attached_gateways(&self) -> Vec<NsName> {
        self.parent_refs.iter().map(|p| p.gateway.clone()).collect()
    }
}

/// Attempts to attach one `parentRef` to its named Gateway/listener,
/// following the precedence in §4.4: Gateway must exist and be valid,
/// `sectionName` (if set) must name an existing listener, the listener's
/// protocol must accept this route kind, and the route's hostnames must
/// intersect the listener's hostname.
pub fn attach_parent_ref(
    parent: &ParentRef,
    gateway: Option<&Gateway>,
    route_hostnames: &[String],
    route_kind: RouteKindFamily,
    route_namespace: &str,
    route_namespace_labels: Option<&BTreeMap<String, String>>,
) -> Attachment {
    let Some(gateway) = gateway.filter(|g| g.valid) else {
        return Attachment {
            listener_key: ListenerKey {
                gateway: parent.gateway.clone(),
                listener_name: parent.section_name.clone().unwrap_or_default(),
            },
            accepted: false,
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_NO_MATCHING_PARENT,
                "parentRef does not name an accepted Gateway",
            )],
            accepted_hostnames: Vec::new(),
        };
    };

    let listeners: Vec<&crate::graph::gateway::Listener> = match &parent.section_name {
        Some(name) => gateway.listener(name).into_iter().collect(),
        None => gateway.listeners.iter().filter(|l| l.valid).collect(),
    };

    if listeners.is_empty() {
        return Attachment {
            listener_key: ListenerKey {
                gateway: parent.gateway.clone(),
                listener_name: parent.section_name.clone().unwrap_or_default(),
            },
            accepted: false,
            conditions: vec![Condition::false_(
                condition::ACCEPTED,
                condition::REASON_NO_MATCHING_PARENT,
                "sectionName does not match any listener",
            )],
            accepted_hostnames: Vec::new(),
        };
    }

    for listener in listeners {
        if !listener.valid || !listener_accepts_kind(listener.protocol, route_kind) {
            continue;
        }
        if let Some(port) = parent.port {
            if port != listener.port {
                continue;
            }
        }
        if !route_namespace_allowed(
            &listener.allowed_route_namespaces,
            &parent.gateway.namespace,
            route_namespace,
            route_namespace_labels,
        ) {
            return Attachment {
                listener_key: ListenerKey {
                    gateway: parent.gateway.clone(),
                    listener_name: listener.name.clone(),
                },
                accepted: false,
                conditions: vec![Condition::false_(
                    condition::ACCEPTED,
                    condition::REASON_NOT_ALLOWED_BY_LISTENERS,
                    "route's namespace is not allowed by the listener's allowedRoutes",
                )],
                accepted_hostnames: Vec::new(),
            };
        }
        let accepted_hostnames = intersect_hostnames(route_hostnames, listener.hostname.as_deref());
        if accepted_hostnames.is_empty() && !route_hostnames.is_empty() {
            continue;
        }
        return Attachment {
            listener_key: ListenerKey {
                gateway: parent.gateway.clone(),
                listener_name: listener.name.clone(),
            },
            accepted: true,
            conditions: vec![Condition::true_(condition::ACCEPTED, condition::REASON_ACCEPTED, "")],
            accepted_hostnames,
        };
    }

    Attachment {
        listener_key: ListenerKey {
            gateway: parent.gateway.clone(),
            listener_name: parent.section_name.clone().unwrap_or_default(),
        },
        accepted: false,
        conditions: vec![Condition::false_(
            condition::ACCEPTED,
            condition::REASON_NO_MATCHING_LISTENER_HOSTNAME,
            "no listener hostname intersects this route's hostnames",
        )],
        accepted_hostnames: Vec::new(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteKindFamily {
    Http,
    Grpc,
    Tls,
}

/// §4.4 step 4: a route in a disallowed namespace is rejected outright
/// regardless of hostname/kind match.
fn route_namespace_allowed(
    allowed: &AllowedRouteNamespaces,
    listener_namespace: &str,
    route_namespace: &str,
    route_namespace_labels: Option<&BTreeMap<String, String>>,
) -> bool {
    match allowed {
        AllowedRouteNamespaces::All => true,
        AllowedRouteNamespaces::Same => listener_namespace == route_namespace,
        AllowedRouteNamespaces::Selector(match_labels) => {
            if match_labels.is_empty() {
                return true;
            }
            route_namespace_labels.is_some_and(|labels| match_labels.iter().all(|(k, v)| labels.get(k) == Some(v)))
        }
    }
}

fn listener_accepts_kind(protocol: crate::graph::gateway::ListenerProtocol, kind: RouteKindFamily) -> bool {
    use crate::graph::gateway::ListenerProtocol as P;
    matches!(
        (protocol, kind),
        (P::Http, RouteKindFamily::Http) | (P::Https, RouteKindFamily::Http) | (P::Tls, RouteKindFamily::Tls)
    )
}

/// Empty hostname list on either side means "matches everything"; otherwise
/// the intersection follows Gateway API's most-specific-label-wins rule,
/// simplified here to exact or wildcard-prefix matches.
fn intersect_hostnames(route_hostnames: &[String], listener_hostname: Option<&str>) -> Vec<String> {
    let Some(listener_hostname) = listener_hostname else {
        return if route_hostnames.is_empty() {
            vec!["*".to_string()]
        } else {
            route_hostnames.to_vec()
        };
    };
    if route_hostnames.is_empty() {
        return vec![listener_hostname.to_string()];
    }
    route_hostnames
        .iter()
        .filter(|h| hostnames_intersect(h, listener_hostname))
        .cloned()
        .collect()
}

fn hostnames_intersect(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let a_wild = a.starts_with("*.");
    let b_wild = b.starts_with("*.");
    match (a_wild, b_wild) {
        (true, false) => b.ends_with(&a[1..]),
        (false, true) => a.ends_with(&b[1..]),
        (true, true) => a[1..].ends_with(&b[1..]) || b[1..].ends_with(&a[1..]),
        (false, false) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::gateway::{AllowedRouteNamespaces, Listener, ListenerProtocol};
    use crate::objects::EffectiveNginxProxy;

    fn gw_with_listener(hostname: Option<&str>) -> Gateway {
        Gateway {
            ns_name: NsName::new("default", "gw"),
            gateway_class_name: "nginx".to_string(),
            deployment_name: "gw-nginx".to_string(),
            listeners: vec![Listener {
                name: "http".to_string(),
                hostname: hostname.map(str::to_string),
                port: 80,
                protocol: ListenerProtocol::Http,
                tls_secret: None,
                allowed_route_namespaces: AllowedRouteNamespaces::Same,
                valid: true,
                conditions: Vec::new(),
                attached_routes: Vec::new(),
            }],
            effective_nginx_proxy: EffectiveNginxProxy::default(),
            valid: true,
            conditions: Vec::new(),
        }
    }

    #[test]
    fn attaches_when_hostnames_intersect() {
        let gw = gw_with_listener(Some("*.example.com"));
        let parent = ParentRef {
            gateway: gw.ns_name.clone(),
            section_name: None,
            port: None,
        };
        let attachment = attach_parent_ref(&parent, Some(&gw), &["api.example.com".to_string()], RouteKindFamily::Http, "default", None);
        assert!(attachment.accepted);
        assert_eq!(attachment.accepted_hostnames, vec!["api.example.com".to_string()]);
    }

    #[test]
    fn rejects_when_hostnames_disjoint() {
        let gw = gw_with_listener(Some("example.com"));
        let parent = ParentRef {
            gateway: gw.ns_name.clone(),
            section_name: None,
            port: None,
        };
        let attachment = attach_parent_ref(&parent, Some(&gw), &["other.org".to_string()], RouteKindFamily::Http, "default", None);
        assert!(!attachment.accepted);
        assert_eq!(attachment.conditions[0].reason, condition::REASON_NO_MATCHING_LISTENER_HOSTNAME);
    }

    #[test]
    fn rejects_cross_namespace_route_when_listener_restricts_to_same() {
        let gw = gw_with_listener(Some("example.com"));
        let parent = ParentRef {
            gateway: gw.ns_name.clone(),
            section_name: None,
            port: None,
        };
        let attachment = attach_parent_ref(&parent, Some(&gw), &["api.example.com".to_string()], RouteKindFamily::Http, "other-ns", None);
        assert!(!attachment.accepted);
        assert_eq!(attachment.conditions[0].reason, condition::REASON_NOT_ALLOWED_BY_LISTENERS);
    }

    #[test]
    fn allows_cross_namespace_route_when_listener_allows_all() {
        let mut gw = gw_with_listener(Some("example.com"));
        gw.listeners[0].allowed_route_namespaces = AllowedRouteNamespaces::All;
        let parent = ParentRef {
            gateway: gw.ns_name.clone(),
            section_name: None,
            port: None,
        };
        let attachment = attach_parent_ref(&parent, Some(&gw), &["api.example.com".to_string()], RouteKindFamily::Http, "other-ns", None);
        assert!(attachment.accepted);
    }
}
