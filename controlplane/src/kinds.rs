//! The closed set of object kinds the object store and relevance tracker
//! know about (§4.1). A Rust-idiomatic strengthening of the original
//! "upsert(obj)/delete(kind, key)" design: unsupported kinds are
//! unrepresentable rather than an error path.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    GatewayClass,
    Gateway,
    HttpRoute,
    GrpcRoute,
    TlsRoute,
    ReferenceGrant,
    BackendTlsPolicy,
    ClientSettingsPolicy,
    ObservabilityPolicy,
    NginxProxy,
    SnippetsFilter,
    Service,
    EndpointSlice,
    Namespace,
    Secret,
    ConfigMap,
    GatewayApiCrd,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::GatewayClass => "GatewayClass",
            ResourceKind::Gateway => "Gateway",
            ResourceKind::HttpRoute => "HTTPRoute",
            ResourceKind::GrpcRoute => "GRPCRoute",
            ResourceKind::TlsRoute => "TLSRoute",
            ResourceKind::ReferenceGrant => "ReferenceGrant",
            ResourceKind::BackendTlsPolicy => "BackendTLSPolicy",
            ResourceKind::ClientSettingsPolicy => "ClientSettingsPolicy",
            ResourceKind::ObservabilityPolicy => "ObservabilityPolicy",
            ResourceKind::NginxProxy => "NginxProxy",
            ResourceKind::SnippetsFilter => "SnippetsFilter",
            ResourceKind::Service => "Service",
            ResourceKind::EndpointSlice => "EndpointSlice",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Secret => "Secret",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::GatewayApiCrd => "CustomResourceDefinition",
        })
    }
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 17] = [
        ResourceKind::GatewayClass,
        ResourceKind::Gateway,
        ResourceKind::HttpRoute,
        ResourceKind::GrpcRoute,
        ResourceKind::TlsRoute,
        ResourceKind::ReferenceGrant,
        ResourceKind::BackendTlsPolicy,
        ResourceKind::ClientSettingsPolicy,
        ResourceKind::ObservabilityPolicy,
        ResourceKind::NginxProxy,
        ResourceKind::SnippetsFilter,
        ResourceKind::Service,
        ResourceKind::EndpointSlice,
        ResourceKind::Namespace,
        ResourceKind::Secret,
        ResourceKind::ConfigMap,
        ResourceKind::GatewayApiCrd,
    ];
}
