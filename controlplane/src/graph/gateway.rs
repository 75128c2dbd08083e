//! Gateway and Listener graph nodes (§4.5 steps 1-3).

use ahash::AHashMap;

use crate::graph::conditions::accepted;
use crate::objects::EffectiveNginxProxy;
use crate::types::{Condition, NsName};

/// A validated (or rejected) `GatewayClass`. The graph only ever has zero or
/// one of these that's "winning" per controller name; Gateways referencing
/// any other GatewayClass are rejected at the Gateway level.
#[derive(Clone, Debug)]
pub struct GatewayClass {
    pub ns_name: NsName,
    pub controller_name: String,
    pub valid: bool,
    pub conditions: Vec<Condition>,
}

/// A single `spec.listeners[]` entry, resolved against its TLS secret (if
/// any) and carrying the set of hostnames it will accept routes for.
#[derive(Clone, Debug)]
pub struct Listener {
    pub name: String,
    pub hostname: Option<String>,
    pub port: u16,
    pub protocol: ListenerProtocol,
    pub tls_secret: Option<NsName>,
    pub allowed_route_namespaces: AllowedRouteNamespaces,
    pub valid: bool,
    pub conditions: Vec<Condition>,
    /// Routes that attached to this listener, tracked here so the Graph can
    /// compute `AcceptedHostnames` without a second pass over every route.
    pub attached_routes: Vec<crate::types::RouteKey>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerProtocol {
    Http,
    Https,
    Tls,
    Tcp,
}

#[derive(Clone, Debug, Default)]
pub enum AllowedRouteNamespaces {
    #[default]
    Same,
    All,
    Selector(AHashMap<String, String>),
}

/// A validated `Gateway`, the central attachment point for routes and most
/// policies (§4.5 step 3, Glossary "Gateway node").
#[derive(Clone, Debug)]
pub struct Gateway {
    pub ns_name: NsName,
    pub gateway_class_name: String,
    /// `"<gateway-name>-<class-name>"`, the name the dataplane deployment
    /// backing this Gateway is addressed by (§3).
    pub deployment_name: String,
    pub listeners: Vec<Listener>,
    pub effective_nginx_proxy: EffectiveNginxProxy,
    pub valid: bool,
    pub conditions: Vec<Condition>,
}

impl Gateway {
    pub fn listener(&self, name: &str) -> Option<&Listener> {
        self.listeners.iter().find(|l| l.name == name)
    }

    pub fn listener_mut(&mut self, name: &str) -> Option<&mut Listener> {
        self.listeners.iter_mut().find(|l| l.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_lookup_is_by_name() {
        let gw = Gateway {
            ns_name: NsName::new("default", "gw"),
            gateway_class_name: "nginx".to_string(),
            deployment_name: "gw-nginx".to_string(),
            listeners: vec![Listener {
                name: "http".to_string(),
                hostname: None,
                port: 80,
                protocol: ListenerProtocol::Http,
                tls_secret: None,
                allowed_route_namespaces: AllowedRouteNamespaces::Same,
                valid: true,
                conditions: vec![accepted()],
                attached_routes: Vec::new(),
            }],
            effective_nginx_proxy: EffectiveNginxProxy::default(),
            valid: true,
            conditions: vec![accepted()],
        };

        assert!(gw.listener("http").is_some());
        assert!(gw.listener("missing").is_none());
    }
}
