//! Cross-namespace reference resolution: checks a `backendRef` or TLS
//! `certificateRef` that crosses a namespace boundary against the
//! `ReferenceGrant` objects in the target namespace (§4.3).

use ahash::AHashMap;
use gateway_api::apis::standard::referencegrants::ReferenceGrant;

use crate::types::NsName;

/// One `(from.group, from.kind, from.namespace) -> (to.kind, to.name?)`
/// permission, flattened out of every `ReferenceGrant.spec.from`/`to` pair
/// for O(1) lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GrantKey {
    from_group: String,
    from_kind: String,
    from_namespace: String,
    to_kind: String,
    to_namespace: String,
}

#[derive(Default)]
pub struct ReferenceResolver {
    /// `name: None` means "any name of this kind in this namespace";
    /// a present name further restricts the grant to that one object.
    grants: AHashMap<GrantKey, Vec<Option<String>>>,
}

pub struct ReferenceQuery<'a> {
    pub from_group: &'a str,
    pub from_kind: &'a str,
    pub from_namespace: &'a str,
    pub to_kind: &'a str,
    pub to: &'a NsName,
}

impl ReferenceResolver {
    pub fn build(reference_grants: impl IntoIterator<Item = (NsName, ReferenceGrant)>) -> Self {
        let mut grants: AHashMap<GrantKey, Vec<Option<String>>> = AHashMap::new();
        for (ns_name, grant) in reference_grants {
            for from in &grant.spec.from {
                for to in &grant.spec.to {
                    let key = GrantKey {
                        from_group: from.group.clone(),
                        from_kind: from.kind.clone(),
                        from_namespace: from.namespace.clone(),
                        to_kind: to.kind.clone(),
                        to_namespace: ns_name.namespace.clone(),
                    };
                    grants.entry(key).or_default().push(to.name.clone());
                }
            }
        }
        Self { grants }
    }

    /// Whether some `ReferenceGrant` in `query.to`'s namespace permits this
    /// reference. Same-namespace references never need a grant and are not
    /// expected to reach this check (the route/backend-ref resolver only
    /// calls it when namespaces differ).
    pub fn is_permitted(&self, query: &ReferenceQuery<'_>) -> bool {
        let key = GrantKey {
            from_group: query.from_group.to_string(),
            from_kind: query.from_kind.to_string(),
            from_namespace: query.from_namespace.to_string(),
            to_kind: query.to_kind.to_string(),
            to_namespace: query.to.namespace.clone(),
        };
        let Some(names) = self.grants.get(&key) else {
            return false;
        };
        names.iter().any(|n| n.as_deref().is_none_or(|n| n == query.to.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_api::apis::standard::referencegrants::{ReferenceGrantFrom, ReferenceGrantSpec, ReferenceGrantTo};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn grant(from_ns: &str, to_name: Option<&str>) -> (NsName, ReferenceGrant) {
        let ns_name = NsName::new("backend-ns", "grant");
        (
            ns_name,
            ReferenceGrant {
                metadata: ObjectMeta {
                    name: Some("grant".to_string()),
                    namespace: Some("backend-ns".to_string()),
                    ..Default::default()
                },
                spec: ReferenceGrantSpec {
                    from: vec![ReferenceGrantFrom {
                        group: "gateway.networking.k8s.io".to_string(),
                        kind: "HTTPRoute".to_string(),
                        namespace: from_ns.to_string(),
                    }],
                    to: vec![ReferenceGrantTo {
                        group: String::new(),
                        kind: "Service".to_string(),
                        name: to_name.map(|n| n.to_string()),
                    }],
                },
            },
        )
    }

    #[test]
    fn permits_when_namespace_and_kind_match_with_no_name_restriction() {
        let resolver = ReferenceResolver::build([grant("app-ns", None)]);
        let permitted = resolver.is_permitted(&ReferenceQuery {
            from_group: "gateway.networking.k8s.io",
            from_kind: "HTTPRoute",
            from_namespace: "app-ns",
            to_kind: "Service",
            to: &NsName::new("backend-ns", "svc"),
        });
        assert!(permitted);
    }

    #[test]
    fn rejects_when_name_restriction_does_not_match() {
        let resolver = ReferenceResolver::build([grant("app-ns", Some("other-svc"))]);
        let permitted = resolver.is_permitted(&ReferenceQuery {
            from_group: "gateway.networking.k8s.io",
            from_kind: "HTTPRoute",
            from_namespace: "app-ns",
            to_kind: "Service",
            to: &NsName::new("backend-ns", "svc"),
        });
        assert!(!permitted);
    }
}
