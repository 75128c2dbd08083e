//! Extracts a `(group, version, kind)` triple off a `backendRef`/`parentRef`
//! style typed reference, used wherever the graph builder needs to tell
//! "this points at a Service" from "this points at something else" without
//! matching on every possible reference type by hand.

/// Minimal shape shared by every Gateway API `*Ref` type this crate reads:
/// an optional group (empty string means the core API group), an optional
/// kind (defaults per the Gateway API spec to the field's implicit kind),
/// and a name.
pub trait GvkExtractor {
    fn group(&self) -> &str;
    fn kind(&self) -> &str;
}

pub const CORE_GROUP: &str = "";
pub const GATEWAY_GROUP: &str = "gateway.networking.k8s.io";

pub fn is_service_ref(group: &str, kind: &str) -> bool {
    group == CORE_GROUP && kind == "Service"
}

pub fn is_gateway_kind(group: &str, kind: &str) -> bool {
    group == GATEWAY_GROUP && kind == "Gateway"
}

pub fn is_config_map_ref(group: &str, kind: &str) -> bool {
    group == CORE_GROUP && kind == "ConfigMap"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_core_service_refs() {
        assert!(is_service_ref("", "Service"));
        assert!(!is_service_ref("apps", "Service"));
    }

    #[test]
    fn recognizes_core_config_map_refs() {
        assert!(is_config_map_ref("", "ConfigMap"));
        assert!(!is_config_map_ref("", "Secret"));
    }
}
