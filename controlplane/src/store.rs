//! The object store (§4.1): the single place watched Kubernetes objects land
//! before the graph builder ever sees them, keyed by namespaced name per
//! kind. Each kind gets its own typed map rather than one `AnyObject` map, so
//! an unsupported kind is a compile error, not a runtime one.

use ahash::AHashMap;
use gateway_api::apis::experimental::{
    backendtlspolicies::BackendTLSPolicy, grpcroutes::GRPCRoute, tlsroutes::TLSRoute,
};
use gateway_api::apis::standard::{
    gatewayclasses::GatewayClass, gateways::Gateway, httproutes::HTTPRoute, referencegrants::ReferenceGrant,
};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret, Service};
use k8s_openapi::api::discovery::v1::EndpointSlice;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;

use crate::consts::BUNDLE_VERSION_ANNOTATION;
use crate::objects::{ClientSettingsPolicy, NginxProxy, ObservabilityPolicy, SnippetsFilter};
use crate::types::NsName;

/// One typed bucket per `ResourceKind`. Every bucket is a plain
/// `namespace/name -> object` map; the store itself never interprets the
/// contents, it only tracks "what do we currently have".
#[derive(Default)]
pub struct ObjectStore {
    pub gateway_classes: AHashMap<NsName, GatewayClass>,
    pub gateways: AHashMap<NsName, Gateway>,
    pub http_routes: AHashMap<NsName, HTTPRoute>,
    pub grpc_routes: AHashMap<NsName, GRPCRoute>,
    pub tls_routes: AHashMap<NsName, TLSRoute>,
    pub reference_grants: AHashMap<NsName, ReferenceGrant>,
    pub backend_tls_policies: AHashMap<NsName, BackendTLSPolicy>,
    pub client_settings_policies: AHashMap<NsName, ClientSettingsPolicy>,
    pub observability_policies: AHashMap<NsName, ObservabilityPolicy>,
    pub nginx_proxies: AHashMap<NsName, NginxProxy>,
    pub snippets_filters: AHashMap<NsName, SnippetsFilter>,
    pub services: AHashMap<NsName, Service>,
    pub endpoint_slices: AHashMap<NsName, EndpointSlice>,
    pub namespaces: AHashMap<NsName, Namespace>,
    pub secrets: AHashMap<NsName, Secret>,
    pub config_maps: AHashMap<NsName, ConfigMap>,
    pub gateway_api_crds: AHashMap<NsName, CustomResourceDefinition>,
}

/// Generates `upsert_<field>`/`delete_<field>`/`get_<field>` for one bucket.
/// A small amount of repetition the teacher's own code favors (see
/// `gateway_utils.rs`'s per-condition-type helper functions) over a single
/// type-erased `Any`-keyed map, since every caller already knows which kind
/// it's working with.
macro_rules! bucket_ops {
    ($field:ident, $ty:ty, $upsert:ident, $delete:ident, $get:ident) => {
        pub fn $upsert(&mut self, ns_name: NsName, obj: $ty) {
            self.$field.insert(ns_name, obj);
        }

        pub fn $delete(&mut self, ns_name: &NsName) -> Option<$ty> {
            self.$field.remove(ns_name)
        }

        pub fn $get(&self, ns_name: &NsName) -> Option<&$ty> {
            self.$field.get(ns_name)
        }
    };
}

impl ObjectStore {
    bucket_ops!(gateway_classes, GatewayClass, upsert_gateway_class, delete_gateway_class, gateway_class);
    bucket_ops!(gateways, Gateway, upsert_gateway, delete_gateway, gateway);
    bucket_ops!(http_routes, HTTPRoute, upsert_http_route, delete_http_route, http_route);
    bucket_ops!(grpc_routes, GRPCRoute, upsert_grpc_route, delete_grpc_route, grpc_route);
    bucket_ops!(tls_routes, TLSRoute, upsert_tls_route, delete_tls_route, tls_route);
    bucket_ops!(
        reference_grants,
        ReferenceGrant,
        upsert_reference_grant,
        delete_reference_grant,
        reference_grant
    );
    bucket_ops!(
        backend_tls_policies,
        BackendTLSPolicy,
        upsert_backend_tls_policy,
        delete_backend_tls_policy,
        backend_tls_policy
    );
    bucket_ops!(
        client_settings_policies,
        ClientSettingsPolicy,
        upsert_client_settings_policy,
        delete_client_settings_policy,
        client_settings_policy
    );
    bucket_ops!(
        observability_policies,
        ObservabilityPolicy,
        upsert_observability_policy,
        delete_observability_policy,
        observability_policy
    );
    bucket_ops!(nginx_proxies, NginxProxy, upsert_nginx_proxy, delete_nginx_proxy, nginx_proxy);
    bucket_ops!(
        snippets_filters,
        SnippetsFilter,
        upsert_snippets_filter,
        delete_snippets_filter,
        snippets_filter
    );
    bucket_ops!(services, Service, upsert_service, delete_service, service);
    bucket_ops!(endpoint_slices, EndpointSlice, upsert_endpoint_slice, delete_endpoint_slice, endpoint_slice);
    bucket_ops!(namespaces, Namespace, upsert_namespace, delete_namespace, namespace);
    bucket_ops!(secrets, Secret, upsert_secret, delete_secret, secret);
    bucket_ops!(config_maps, ConfigMap, upsert_config_map, delete_config_map, config_map);

    pub fn delete_gateway_api_crd(&mut self, ns_name: &NsName) -> Option<CustomResourceDefinition> {
        self.gateway_api_crds.remove(ns_name)
    }

    pub fn gateway_api_crd(&self, ns_name: &NsName) -> Option<&CustomResourceDefinition> {
        self.gateway_api_crds.get(ns_name)
    }

    /// Upserts one Gateway API CRD object, returning whether its
    /// bundle-version annotation differs from what was previously observed
    /// (§4.2: a CRD upsert is relevant only if that annotation changed).
    pub fn upsert_gateway_api_crd(&mut self, ns_name: NsName, crd: CustomResourceDefinition) -> bool {
        let previous = self.gateway_api_crds.get(&ns_name).and_then(bundle_version_annotation);
        let changed = previous != bundle_version_annotation(&crd);
        self.gateway_api_crds.insert(ns_name, crd);
        changed
    }
}

/// Reads the `gateway.networking.k8s.io/bundle-version` annotation off a
/// Gateway API CRD object, if present (§7, "CRD compatibility").
pub fn bundle_version_annotation(crd: &CustomResourceDefinition) -> Option<&str> {
    crd.metadata.annotations.as_ref()?.get(BUNDLE_VERSION_ANNOTATION).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn upsert_then_delete_round_trips() {
        let mut store = ObjectStore::default();
        let key = NsName::new("default", "svc");
        store.upsert_service(
            key.clone(),
            Service {
                metadata: ObjectMeta {
                    name: Some("svc".to_string()),
                    namespace: Some("default".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        assert!(store.service(&key).is_some());
        assert!(store.delete_service(&key).is_some());
        assert!(store.service(&key).is_none());
    }

    fn crd_with_bundle_version(version: &str) -> CustomResourceDefinition {
        let mut annotations = std::collections::BTreeMap::new();
        annotations.insert(BUNDLE_VERSION_ANNOTATION.to_string(), version.to_string());
        CustomResourceDefinition {
            metadata: ObjectMeta {
                name: Some("gatewayclasses.gateway.networking.k8s.io".to_string()),
                annotations: Some(annotations),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn crd_upsert_reports_unchanged_bundle_version() {
        let mut store = ObjectStore::default();
        let key = NsName::cluster_scoped("gatewayclasses.gateway.networking.k8s.io");
        assert!(store.upsert_gateway_api_crd(key.clone(), crd_with_bundle_version("v1.1.0")));
        assert!(!store.upsert_gateway_api_crd(key, crd_with_bundle_version("v1.1.0")));
    }

    #[test]
    fn crd_upsert_reports_changed_bundle_version() {
        let mut store = ObjectStore::default();
        let key = NsName::cluster_scoped("gatewayclasses.gateway.networking.k8s.io");
        store.upsert_gateway_api_crd(key.clone(), crd_with_bundle_version("v1.1.0"));
        assert!(store.upsert_gateway_api_crd(key, crd_with_bundle_version("v1.2.0")));
    }
}
