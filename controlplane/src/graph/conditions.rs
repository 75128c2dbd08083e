//! Shared helpers for building the condition vocabulary (§9 Glossary,
//! "Condition"). Kept free of any one object kind's specifics so gateway.rs,
//! route.rs, and policy.rs can all build on the same vocabulary.

use crate::consts::condition;
use crate::types::Condition;

pub fn accepted() -> Condition {
    Condition::true_(condition::ACCEPTED, condition::REASON_ACCEPTED, "")
}

pub fn not_accepted(reason: &str, message: impl Into<String>) -> Condition {
    Condition::false_(condition::ACCEPTED, reason, message)
}

pub fn programmed() -> Condition {
    Condition::true_(condition::PROGRAMMED, condition::REASON_ACCEPTED, "")
}

pub fn not_programmed(reason: &str, message: impl Into<String>) -> Condition {
    Condition::false_(condition::PROGRAMMED, reason, message)
}

pub fn resolved_refs() -> Condition {
    Condition::true_(condition::RESOLVED_REFS, condition::REASON_ACCEPTED, "")
}

pub fn refs_not_resolved(reason: &str, message: impl Into<String>) -> Condition {
    Condition::false_(condition::RESOLVED_REFS, reason, message)
}

/// An installed Gateway API CRD's bundle-version annotation doesn't match
/// this build's compiled-in version (§7, "CRD compatibility"). Still
/// `Accepted=True`: this is a compatibility warning, not a rejection.
pub fn supported_version_best_effort(observed: &str, supported: &str) -> Condition {
    Condition::true_(
        condition::ACCEPTED,
        condition::REASON_GATEWAY_CLASS_SUPPORTED_VERSION_BEST_EFFORT,
        format!("installed Gateway API CRD bundle-version {observed} does not match supported {supported}; proceeding best-effort"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConditionStatus;

    #[test]
    fn accepted_is_true_status() {
        assert_eq!(accepted().status, ConditionStatus::True);
        assert_eq!(not_accepted("Invalid", "bad").status, ConditionStatus::False);
    }

    #[test]
    fn bundle_version_mismatch_is_still_accepted() {
        let cond = supported_version_best_effort("v1.0.0", "v1.1.0");
        assert_eq!(cond.status, ConditionStatus::True);
        assert_eq!(cond.reason, condition::REASON_GATEWAY_CLASS_SUPPORTED_VERSION_BEST_EFFORT);
    }
}
