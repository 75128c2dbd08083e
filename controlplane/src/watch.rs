//! Binary-only wiring: turns `kube::runtime::watcher` streams for every
//! watched kind into `ChangeProcessor` calls. Nothing in here is reachable
//! from the pure graph-building code; it exists so `main.rs` stays a thin
//! assembly of `tokio::spawn` calls over this module's event loop.

use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::runtime::watcher::{self, Event};
use kube::{Api, Client, Resource};
use tokio::sync::mpsc;
use tracing::warn;

use crate::kinds::ResourceKind;
use crate::types::NsName;

/// One observed change to a watched object, kind-tagged so the event loop
/// can route it to the right `ObjectStore` bucket without downcasting.
pub enum WatchEvent {
    GatewayClass(Event<gateway_api::apis::standard::gatewayclasses::GatewayClass>),
    Gateway(Event<gateway_api::apis::standard::gateways::Gateway>),
    HttpRoute(Event<gateway_api::apis::standard::httproutes::HTTPRoute>),
    GrpcRoute(Event<gateway_api::apis::experimental::grpcroutes::GRPCRoute>),
    TlsRoute(Event<gateway_api::apis::experimental::tlsroutes::TLSRoute>),
    ReferenceGrant(Event<gateway_api::apis::standard::referencegrants::ReferenceGrant>),
    BackendTlsPolicy(Event<gateway_api::apis::experimental::backendtlspolicies::BackendTLSPolicy>),
    ClientSettingsPolicy(Event<crate::objects::ClientSettingsPolicy>),
    ObservabilityPolicy(Event<crate::objects::ObservabilityPolicy>),
    NginxProxy(Event<crate::objects::NginxProxy>),
    SnippetsFilter(Event<crate::objects::SnippetsFilter>),
    Service(Event<k8s_openapi::api::core::v1::Service>),
    EndpointSlice(Event<k8s_openapi::api::discovery::v1::EndpointSlice>),
    Namespace(Event<k8s_openapi::api::core::v1::Namespace>),
    Secret(Event<k8s_openapi::api::core::v1::Secret>),
    ConfigMap(Event<k8s_openapi::api::core::v1::ConfigMap>),
    GatewayApiCrd(Event<CustomResourceDefinition>),
}

/// Spawns one `kube::runtime::watcher` task per kind and forwards every
/// event onto a single channel. Returns the receiving half; the caller owns
/// the event loop that drains it into a `ChangeProcessor`.
pub fn spawn_watchers(client: Client) -> mpsc::Receiver<WatchEvent> {
    let (tx, rx) = mpsc::channel(1024);

    spawn_one(Api::<gateway_api::apis::standard::gatewayclasses::GatewayClass>::all(client.clone()), tx.clone(), WatchEvent::GatewayClass);
    spawn_one(Api::<gateway_api::apis::standard::gateways::Gateway>::all(client.clone()), tx.clone(), WatchEvent::Gateway);
    spawn_one(Api::<gateway_api::apis::standard::httproutes::HTTPRoute>::all(client.clone()), tx.clone(), WatchEvent::HttpRoute);
    spawn_one(Api::<gateway_api::apis::experimental::grpcroutes::GRPCRoute>::all(client.clone()), tx.clone(), WatchEvent::GrpcRoute);
    spawn_one(Api::<gateway_api::apis::experimental::tlsroutes::TLSRoute>::all(client.clone()), tx.clone(), WatchEvent::TlsRoute);
    spawn_one(
        Api::<gateway_api::apis::standard::referencegrants::ReferenceGrant>::all(client.clone()),
        tx.clone(),
        WatchEvent::ReferenceGrant,
    );
    spawn_one(
        Api::<gateway_api::apis::experimental::backendtlspolicies::BackendTLSPolicy>::all(client.clone()),
        tx.clone(),
        WatchEvent::BackendTlsPolicy,
    );
    spawn_one(Api::<crate::objects::ClientSettingsPolicy>::all(client.clone()), tx.clone(), WatchEvent::ClientSettingsPolicy);
    spawn_one(Api::<crate::objects::ObservabilityPolicy>::all(client.clone()), tx.clone(), WatchEvent::ObservabilityPolicy);
    spawn_one(Api::<crate::objects::NginxProxy>::all(client.clone()), tx.clone(), WatchEvent::NginxProxy);
    spawn_one(Api::<crate::objects::SnippetsFilter>::all(client.clone()), tx.clone(), WatchEvent::SnippetsFilter);
    spawn_one(Api::<k8s_openapi::api::core::v1::Service>::all(client.clone()), tx.clone(), WatchEvent::Service);
    spawn_one(Api::<k8s_openapi::api::discovery::v1::EndpointSlice>::all(client.clone()), tx.clone(), WatchEvent::EndpointSlice);
    spawn_one(Api::<k8s_openapi::api::core::v1::Namespace>::all(client.clone()), tx.clone(), WatchEvent::Namespace);
    spawn_one(Api::<k8s_openapi::api::core::v1::Secret>::all(client.clone()), tx.clone(), WatchEvent::Secret);
    spawn_one(Api::<k8s_openapi::api::core::v1::ConfigMap>::all(client.clone()), tx.clone(), WatchEvent::ConfigMap);
    spawn_one(Api::<CustomResourceDefinition>::all(client), tx, WatchEvent::GatewayApiCrd);

    rx
}

fn spawn_one<K>(api: Api<K>, tx: mpsc::Sender<WatchEvent>, wrap: impl Fn(Event<K>) -> WatchEvent + Send + 'static)
where
    K: Resource + Clone + std::fmt::Debug + serde::de::DeserializeOwned + Send + Sync + 'static,
    K::DynamicType: Default,
{
    tokio::spawn(async move {
        let mut stream = Box::pin(watcher::watcher(api, watcher::Config::default()));
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => {
                    if tx.send(wrap(event)).await.is_err() {
                        return;
                    }
                }
                Err(error) => warn!(%error, kind = std::any::type_name::<K>(), "watch stream error"),
            }
        }
    });
}

/// Applies one `WatchEvent` to the store, returning the kind and namespaced
/// name touched so the caller can ask the `RelevanceTracker` whether a
/// rebuild is worth triggering.
pub fn apply(store: &mut crate::store::ObjectStore, event: WatchEvent) -> Vec<(ResourceKind, NsName)> {
    macro_rules! handle {
        ($event:expr, $kind:expr, $upsert:ident, $delete:ident) => {
            match $event {
                Event::Apply(obj) | Event::InitApply(obj) => {
                    let Ok(ns_name) = ns_name_of(&obj) else { return Vec::new() };
                    store.$upsert(ns_name.clone(), obj);
                    vec![($kind, ns_name)]
                }
                Event::Delete(obj) => {
                    let Ok(ns_name) = ns_name_of(&obj) else { return Vec::new() };
                    store.$delete(&ns_name);
                    vec![($kind, ns_name)]
                }
                Event::Init | Event::InitDone => Vec::new(),
            }
        };
    }

    match event {
        WatchEvent::GatewayClass(e) => handle!(e, ResourceKind::GatewayClass, upsert_gateway_class, delete_gateway_class),
        WatchEvent::Gateway(e) => handle!(e, ResourceKind::Gateway, upsert_gateway, delete_gateway),
        WatchEvent::HttpRoute(e) => handle!(e, ResourceKind::HttpRoute, upsert_http_route, delete_http_route),
        WatchEvent::GrpcRoute(e) => handle!(e, ResourceKind::GrpcRoute, upsert_grpc_route, delete_grpc_route),
        WatchEvent::TlsRoute(e) => handle!(e, ResourceKind::TlsRoute, upsert_tls_route, delete_tls_route),
        WatchEvent::ReferenceGrant(e) => handle!(e, ResourceKind::ReferenceGrant, upsert_reference_grant, delete_reference_grant),
        WatchEvent::BackendTlsPolicy(e) => handle!(e, ResourceKind::BackendTlsPolicy, upsert_backend_tls_policy, delete_backend_tls_policy),
        WatchEvent::ClientSettingsPolicy(e) => handle!(e, ResourceKind::ClientSettingsPolicy, upsert_client_settings_policy, delete_client_settings_policy),
        WatchEvent::ObservabilityPolicy(e) => handle!(e, ResourceKind::ObservabilityPolicy, upsert_observability_policy, delete_observability_policy),
        WatchEvent::NginxProxy(e) => handle!(e, ResourceKind::NginxProxy, upsert_nginx_proxy, delete_nginx_proxy),
        WatchEvent::SnippetsFilter(e) => handle!(e, ResourceKind::SnippetsFilter, upsert_snippets_filter, delete_snippets_filter),
        WatchEvent::Service(e) => handle!(e, ResourceKind::Service, upsert_service, delete_service),
        WatchEvent::EndpointSlice(e) => match e {
            Event::Apply(eps) | Event::InitApply(eps) => {
                let Ok(ns_name) = ns_name_of(&eps) else { return Vec::new() };
                let touched = service_ns_name_of(&eps);
                store.upsert_endpoint_slice(ns_name, eps);
                touched.map_or_else(Vec::new, |svc| vec![(ResourceKind::Service, svc)])
            }
            Event::Delete(eps) => {
                let Ok(ns_name) = ns_name_of(&eps) else { return Vec::new() };
                let touched = service_ns_name_of(&eps);
                store.delete_endpoint_slice(&ns_name);
                touched.map_or_else(Vec::new, |svc| vec![(ResourceKind::Service, svc)])
            }
            Event::Init | Event::InitDone => Vec::new(),
        },
        WatchEvent::Namespace(e) => handle!(e, ResourceKind::Namespace, upsert_namespace, delete_namespace),
        WatchEvent::Secret(e) => handle!(e, ResourceKind::Secret, upsert_secret, delete_secret),
        WatchEvent::ConfigMap(e) => handle!(e, ResourceKind::ConfigMap, upsert_config_map, delete_config_map),
        WatchEvent::GatewayApiCrd(e) => match e {
            Event::Apply(crd) | Event::InitApply(crd) => {
                if !is_gateway_api_crd(&crd) {
                    return Vec::new();
                }
                let Ok(ns_name) = ns_name_of(&crd) else { return Vec::new() };
                if store.upsert_gateway_api_crd(ns_name.clone(), crd) {
                    vec![(ResourceKind::GatewayApiCrd, ns_name)]
                } else {
                    Vec::new()
                }
            }
            Event::Delete(crd) => {
                if !is_gateway_api_crd(&crd) {
                    return Vec::new();
                }
                let Ok(ns_name) = ns_name_of(&crd) else { return Vec::new() };
                store.delete_gateway_api_crd(&ns_name);
                vec![(ResourceKind::GatewayApiCrd, ns_name)]
            }
            Event::Init | Event::InitDone => Vec::new(),
        },
    }
}

/// Cluster watches every `CustomResourceDefinition`; this crate only cares
/// about the ones Gateway API itself installs.
fn is_gateway_api_crd(crd: &CustomResourceDefinition) -> bool {
    crd.metadata.name.as_deref().is_some_and(|name| name.ends_with(".gateway.networking.k8s.io"))
}

/// An EndpointSlice's relevance is governed by the Service it backs (§4.2),
/// read off its `kubernetes.io/service-name` label, not by its own name.
fn service_ns_name_of(eps: &k8s_openapi::api::discovery::v1::EndpointSlice) -> Option<NsName> {
    let namespace = eps.metadata.namespace.clone().unwrap_or_default();
    let name = eps.metadata.labels.as_ref()?.get(crate::consts::ENDPOINTSLICE_SERVICE_NAME_LABEL)?.clone();
    Some(NsName::new(namespace, name))
}

fn ns_name_of<K: Resource>(obj: &K) -> crate::Result<NsName> {
    let name = obj.meta().name.clone().ok_or(crate::Error::MissingResourceName)?;
    let namespace = obj.meta().namespace.clone().unwrap_or_default();
    Ok(NsName::new(namespace, name))
}
