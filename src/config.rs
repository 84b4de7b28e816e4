use serde::{Deserialize, Serialize};

use crate::billing::{EntitlementSettings, RequiredTierScan, UnknownFeaturePolicy};
use crate::error::PlangateError;
use crate::utils::get_env_with_prefix;

/// Main configuration for plangate
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub entitlements: EntitlementSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

/// Builder for Config with environment variable support
///
/// # Example
///
/// ```rust
/// use plangate::{ConfigBuilder, UnknownFeaturePolicy};
///
/// let config = ConfigBuilder::new()
///     .with_near_limit_threshold(90.0)
///     .with_unknown_feature_policy(UnknownFeaturePolicy::Deny)
///     .build()
///     .unwrap();
/// assert_eq!(config.entitlements.near_limit_threshold, 90.0);
/// ```
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
    env_errors: Vec<String>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            env_errors: Vec::new(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_entitlements(mut self, settings: EntitlementSettings) -> Self {
        self.config.entitlements = settings;
        self
    }

    /// Set the usage percentage reported as "near the limit"
    pub fn with_near_limit_threshold(mut self, threshold: f64) -> Self {
        self.config.entitlements.near_limit_threshold = threshold;
        self
    }

    pub fn with_required_tier_scan(mut self, scan: RequiredTierScan) -> Self {
        self.config.entitlements.required_tier_scan = scan;
        self
    }

    pub fn with_unknown_feature_policy(mut self, policy: UnknownFeaturePolicy) -> Self {
        self.config.entitlements.unknown_feature_policy = policy;
        self
    }

    /// Load configuration from environment variables with PLANGATE_ prefix
    ///
    /// Malformed values are reported by [`build`](Self::build) rather than
    /// silently ignored.
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(threshold) = get_env_with_prefix("NEAR_LIMIT_THRESHOLD") {
            match threshold.trim().parse() {
                Ok(t) => self.config.entitlements.near_limit_threshold = t,
                Err(_) => self
                    .env_errors
                    .push(format!("NEAR_LIMIT_THRESHOLD is not a number: {}", threshold)),
            }
        }
        if let Some(scan) = get_env_with_prefix("REQUIRED_TIER_SCAN") {
            match scan.parse() {
                Ok(s) => self.config.entitlements.required_tier_scan = s,
                Err(e) => self.env_errors.push(e),
            }
        }
        if let Some(policy) = get_env_with_prefix("UNKNOWN_FEATURE_POLICY") {
            match policy.parse() {
                Ok(p) => self.config.entitlements.unknown_feature_policy = p,
                Err(e) => self.env_errors.push(e),
            }
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Unparseable environment values
    /// - Invalid log level
    /// - Near-limit threshold outside (0, 100]
    pub fn build(self) -> crate::error::Result<Config> {
        if let Some(err) = self.env_errors.into_iter().next() {
            return Err(PlangateError::config(err));
        }

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(PlangateError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        self.config.entitlements.validate()?;

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::BillingError;

    #[test]
    fn test_default_config_builds() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.entitlements, EntitlementSettings::default());
    }

    #[test]
    fn test_invalid_log_level() {
        let err = ConfigBuilder::new().with_log_level("loud").build().unwrap_err();
        assert!(matches!(err, PlangateError::Config(_)));
    }

    #[test]
    fn test_invalid_threshold() {
        let err = ConfigBuilder::new()
            .with_near_limit_threshold(0.0)
            .build()
            .unwrap_err();
        assert_eq!(
            err.as_billing(),
            Some(&BillingError::InvalidThreshold { value: 0.0 })
        );
    }

    #[test]
    fn test_builder_settings() {
        let config = ConfigBuilder::new()
            .with_log_level("debug")
            .with_json_logging(true)
            .with_required_tier_scan(RequiredTierScan::Descending)
            .with_unknown_feature_policy(UnknownFeaturePolicy::Deny)
            .build()
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.entitlements.required_tier_scan, RequiredTierScan::Descending);
        assert_eq!(config.entitlements.unknown_feature_policy, UnknownFeaturePolicy::Deny);
    }

    // Env tests share process state, so they use keys no other test touches.
    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("PLANGATE_NEAR_LIMIT_THRESHOLD", "95");
            std::env::set_var("PLANGATE_UNKNOWN_FEATURE_POLICY", "deny");
            std::env::set_var("PLANGATE_REQUIRED_TIER_SCAN", "descending");
        }

        let config = ConfigBuilder::new().from_env().build();

        unsafe {
            std::env::remove_var("PLANGATE_NEAR_LIMIT_THRESHOLD");
            std::env::remove_var("PLANGATE_UNKNOWN_FEATURE_POLICY");
            std::env::remove_var("PLANGATE_REQUIRED_TIER_SCAN");
        }

        let config = config.unwrap();
        assert_eq!(config.entitlements.near_limit_threshold, 95.0);
        assert_eq!(config.entitlements.unknown_feature_policy, UnknownFeaturePolicy::Deny);
        assert_eq!(config.entitlements.required_tier_scan, RequiredTierScan::Descending);
    }

    #[test]
    fn test_config_from_json() {
        let config: Config = serde_json::from_str(
            r#"{ "entitlements": { "near_limit_threshold": 75 } }"#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.entitlements.near_limit_threshold, 75.0);
    }
}
