// Controller identity used to claim GatewayClasses and as the Gateway API
// controller name stamped on status conditions.
pub const DEFAULT_CONTROLLER_NAME: &str = "gateway.nginx.org/nginx-gateway-controller";

// Name of the single GatewayClass this build honors absent an operator
// override.
pub const DEFAULT_GATEWAY_CLASS_NAME: &str = "nginx";

// A policy's ancestor list is silently truncated at this length (I5).
pub const MAX_POLICY_ANCESTORS: usize = 16;

// Label read off an EndpointSlice to find the Service it backs.
pub const ENDPOINTSLICE_SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

// Key expected in a CA bundle ConfigMap.
pub const CA_CRT_KEY: &str = "ca.crt";

// Keys expected in a TLS certificate Secret.
pub const TLS_CERT_KEY: &str = "tls.crt";
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

// Compiled-in Gateway API bundle version this build was validated against.
pub const SUPPORTED_BUNDLE_VERSION: &str = "v1.1.0";
pub const BUNDLE_VERSION_ANNOTATION: &str = "gateway.networking.k8s.io/bundle-version";

pub mod condition {
    // Condition types.
    pub const ACCEPTED: &str = "Accepted";
    pub const PROGRAMMED: &str = "Programmed";
    pub const RESOLVED_REFS: &str = "ResolvedRefs";

    // Condition reasons.
    pub const REASON_ACCEPTED: &str = "Accepted";
    pub const REASON_GATEWAY_CLASS_NOT_FOUND: &str = "GatewayClassNotFound";
    pub const REASON_INVALID_LISTENER: &str = "InvalidListener";
    pub const REASON_NO_MATCHING_PARENT: &str = "NoMatchingParent";
    pub const REASON_NO_MATCHING_LISTENER_HOSTNAME: &str = "NoMatchingListenerHostname";
    pub const REASON_NOT_ALLOWED_BY_LISTENERS: &str = "NotAllowedByListeners";
    pub const REASON_REF_NOT_PERMITTED: &str = "RefNotPermitted";
    pub const REASON_TARGET_NOT_FOUND: &str = "TargetNotFound";
    pub const REASON_TARGET_INVALID: &str = "TargetInvalid";
    pub const REASON_TARGET_CONFLICT: &str = "TargetConflict";
    pub const REASON_POLICY_CONFLICTED: &str = "PolicyConflicted";
    pub const REASON_POLICY_NOT_ACCEPTED_NGINX_PROXY_NOT_SET: &str =
        "PolicyNotAcceptedNginxProxyNotSet";
    pub const REASON_BACKEND_REF_INVALID_KIND: &str = "BackendRefInvalidKind";
    pub const REASON_BACKEND_REF_NOT_FOUND: &str = "BackendRefNotFound";
    pub const REASON_BACKEND_REF_UNSUPPORTED_PROTOCOL: &str = "BackendRefUnsupportedProtocol";
    pub const REASON_GATEWAY_CLASS_SUPPORTED_VERSION_BEST_EFFORT: &str =
        "GatewayClassSupportedVersionBestEffort";
}
