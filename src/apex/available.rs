//! Availability of a module for a bundle or for the platform.

/// Pseudo bundle name for the non-bundle partitions.
pub const AVAILABLE_TO_PLATFORM: &str = "//apex_available:platform";
/// Pseudo bundle name matching any bundle.
pub const AVAILABLE_TO_ANY_APEX: &str = "//apex_available:anyapex";
/// Pseudo bundle name matching any GKI bundle.
pub const AVAILABLE_TO_GKI_APEX: &str = "com.android.gki.*";

const GKI_APEX_PREFIX: &str = "com.android.gki.";

/// True for the sentinels that are not module names.
pub fn is_availability_sentinel(name: &str) -> bool {
    name == AVAILABLE_TO_PLATFORM || name == AVAILABLE_TO_ANY_APEX || name == AVAILABLE_TO_GKI_APEX
}

/// Whether `apex_available` lets a module be part of `what`, which is a
/// bundle name or [`AVAILABLE_TO_PLATFORM`].
pub fn check_available_for_apex(what: &str, apex_available: &[String]) -> bool {
    // An empty list means available to the platform and no bundle.
    if apex_available.is_empty() {
        return what == AVAILABLE_TO_PLATFORM;
    }
    let listed = |name: &str| apex_available.iter().any(|a| a == name);
    listed(what)
        || (what != AVAILABLE_TO_PLATFORM && listed(AVAILABLE_TO_ANY_APEX))
        || (what.starts_with(GKI_APEX_PREFIX) && listed(AVAILABLE_TO_GKI_APEX))
}
