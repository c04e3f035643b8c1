//! Pipeline configuration from TOML (`[retry]`, `[resources]`, `[prompt]`)

use math_comic_application::{AdmissionPolicy, ResourceManager};
use math_comic_domain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            multiplier: policy.multiplier,
        }
    }
}

impl FileRetryConfig {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResourcesConfig {
    pub max_concurrent_api_calls: usize,
    pub max_concurrent_pipelines: usize,
    pub admission: AdmissionPolicy,
}

impl Default for FileResourcesConfig {
    fn default() -> Self {
        Self {
            max_concurrent_api_calls: math_comic_application::resources::DEFAULT_MAX_API_CALLS,
            max_concurrent_pipelines: math_comic_application::resources::DEFAULT_MAX_PIPELINES,
            admission: AdmissionPolicy::Queue,
        }
    }
}

impl FileResourcesConfig {
    pub fn to_resource_manager(&self) -> ResourceManager {
        ResourceManager::new(
            self.max_concurrent_api_calls,
            self.max_concurrent_pipelines,
            self.admission,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePromptConfig {
    /// Rewrite prompts through a second gateway call (off by default)
    pub optimize: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults_match_policy() {
        assert_eq!(
            FileRetryConfig::default().to_retry_policy(),
            RetryPolicy::default()
        );
    }

    #[test]
    fn test_admission_deserialize() {
        let config: FileResourcesConfig = toml::from_str(r#"admission = "reject""#).unwrap();
        assert_eq!(config.admission, AdmissionPolicy::Reject);
        assert_eq!(config.max_concurrent_api_calls, 4);
    }
}
