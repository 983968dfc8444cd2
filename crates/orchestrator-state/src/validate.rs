//! Limits applied to access paths before they are parsed.

use crate::error::PatchError;

/// Maximum allowed path string length, in bytes.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Maximum number of segments in a path.
pub const MAX_PATH_DEPTH: usize = 256;

/// Validate an access path string before parsing.
///
/// # Errors
///
/// Returns a malformed-path error if the string is empty or longer than
/// [`MAX_PATH_LENGTH`].
///
/// # Example
///
/// ```
/// use orchestrator_state::validate_access_path;
///
/// validate_access_path("service_hosts[0].hostname").unwrap();
/// validate_access_path("").unwrap_err();
/// ```
pub fn validate_access_path(path: &str) -> Result<(), PatchError> {
    if path.is_empty() {
        return Err(PatchError::malformed(path, "empty path"));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(PatchError::malformed(
            &path.chars().take(64).collect::<String>(),
            format!("path longer than {MAX_PATH_LENGTH} bytes"),
        ));
    }
    Ok(())
}

/// Validate the number of segments in a parsed path.
pub fn validate_depth(path: &str, depth: usize) -> Result<(), PatchError> {
    if depth > MAX_PATH_DEPTH {
        return Err(PatchError::malformed(
            path,
            format!("path deeper than {MAX_PATH_DEPTH} segments"),
        ));
    }
    Ok(())
}

/// Check if a string consists only of ASCII digits.
pub fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
