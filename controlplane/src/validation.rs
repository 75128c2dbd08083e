//! Validation configuration threaded through the graph builder. Bundled into
//! one struct the way the teacher bundles reconciler dependencies, rather
//! than passed as a long parameter list to every validating function.

use crate::consts::SUPPORTED_BUNDLE_VERSION;

/// Toggles and reference data the graph builder's validation steps need but
/// that aren't themselves part of the watched object set.
#[derive(Clone, Debug)]
pub struct Validators {
    pub controller_name: String,
    /// Name of the single GatewayClass this build honors (§4.5 step 1): a
    /// GatewayClass whose name doesn't match this is never marked valid,
    /// even when its `controllerName` matches.
    pub gateway_class_name: String,
    /// Gateway API bundle version this build was validated against; a
    /// Gateway API CRD install whose bundle-version annotation mismatches
    /// gets a best-effort `Accepted` rather than a hard failure (§7).
    pub supported_bundle_version: &'static str,
    /// Whether GRPCRoute/TLSRoute attachment is enabled at all; lets an
    /// operator run HTTP-only without the experimental Gateway API channel.
    pub experimental_routes_enabled: bool,
}

impl Default for Validators {
    fn default() -> Self {
        Self {
            controller_name: crate::consts::DEFAULT_CONTROLLER_NAME.to_string(),
            gateway_class_name: crate::consts::DEFAULT_GATEWAY_CLASS_NAME.to_string(),
            supported_bundle_version: SUPPORTED_BUNDLE_VERSION,
            experimental_routes_enabled: true,
        }
    }
}

impl Validators {
    pub fn bundle_version_matches(&self, observed: Option<&str>) -> bool {
        observed.is_none_or(|v| v == self.supported_bundle_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bundle_version_annotation_is_treated_as_matching() {
        let validators = Validators::default();
        assert!(validators.bundle_version_matches(None));
    }

    #[test]
    fn mismatched_bundle_version_is_detected() {
        let validators = Validators::default();
        assert!(!validators.bundle_version_matches(Some("v0.9.0")));
    }
}
