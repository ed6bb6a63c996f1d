use crate::api_level::ApiLevel;
use crate::error::{ApexError, Result};

/// Highest version in `version_list` that is `<= max_sdk_version`.
///
/// `version_list` is expected in ascending order; it is scanned from the end
/// so the first match is the highest acceptable version.
pub fn choose_sdk_version(
    version_list: &[String],
    max_sdk_version: &ApiLevel,
    active_codenames: &[String],
) -> Result<String> {
    let not_found = |source: Option<ApexError>| ApexError::NoSdkVersion {
        ceiling: max_sdk_version.to_string(),
        candidates: version_list.to_vec(),
        source: source.map(Box::new),
    };

    for version in version_list.iter().rev() {
        let level = ApiLevel::from_user(version, active_codenames)
            .map_err(|e| not_found(Some(e)))?;
        if level <= *max_sdk_version {
            return Ok(version.clone());
        }
    }
    Err(not_found(None))
}
