/// Get environment variable with PLANGATE_ prefix, falling back to unprefixed version
///
/// This helper function checks for `PLANGATE_{key}` first, then falls back to `{key}`
/// so deployments can share variables such as `LOG_LEVEL` with other services.
///
/// # Examples
///
/// ```rust
/// use plangate::utils::get_env_with_prefix;
///
/// // Checks PLANGATE_NEAR_LIMIT_THRESHOLD first, then NEAR_LIMIT_THRESHOLD
/// let threshold = get_env_with_prefix("NEAR_LIMIT_THRESHOLD");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("PLANGATE_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        // Prefixed value wins
        unsafe {
            std::env::set_var("PLANGATE_ENV_TEST_VAR", "prefixed_value");
            std::env::set_var("ENV_TEST_VAR", "unprefixed_value");
        }
        assert_eq!(get_env_with_prefix("ENV_TEST_VAR"), Some("prefixed_value".to_string()));
        unsafe {
            std::env::remove_var("PLANGATE_ENV_TEST_VAR");
        }

        // Unprefixed fallback
        assert_eq!(get_env_with_prefix("ENV_TEST_VAR"), Some("unprefixed_value".to_string()));
        unsafe {
            std::env::remove_var("ENV_TEST_VAR");
        }

        // Test non-existent variable
        assert_eq!(get_env_with_prefix("ENV_TEST_MISSING_VAR"), None);
    }
}
