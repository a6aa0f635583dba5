//! Settings file for levelwatch
//!
//! Every key is optional; command-line flags override file values.

use std::fs;
use std::num::NonZeroU64;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

use levelwatch_k8s::TailOptions;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Pod to tail
    pub pod: Option<String>,

    pub namespace: String,

    /// Container within the pod (first container when unset)
    pub container: Option<String>,

    /// Kubeconfig context (inferred when unset)
    pub context: Option<String>,

    /// Historical lines to start from; negative means the whole log
    pub tail_lines: i64,

    pub follow: bool,

    /// Print the totals block every this many lines
    pub summary_every: u64,

    /// Print the totals block once more when the stream ends
    pub final_summary: bool,
}

impl Default for Config {
    fn default() -> Self {
        let stream = TailOptions::default();
        Self {
            pod: None,
            namespace: "default".to_string(),
            container: None,
            context: None,
            tail_lines: stream.tail_lines.unwrap_or(-1),
            follow: stream.follow,
            summary_every: 60,
            final_summary: false,
        }
    }
}

impl Config {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .context(format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check that the settings describe a runnable tail
    pub fn validate(&self, from_stdin: bool) -> Result<()> {
        self.summary_interval()?;
        ensure!(
            from_stdin || self.pod.is_some(),
            "A pod name is required unless --stdin is given"
        );
        Ok(())
    }

    pub fn summary_interval(&self) -> Result<NonZeroU64> {
        NonZeroU64::new(self.summary_every).context("summary_every must be greater than 0")
    }

    pub fn tail_options(&self) -> TailOptions {
        TailOptions {
            follow: self.follow,
            tail_lines: (self.tail_lines >= 0).then_some(self.tail_lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.summary_interval().unwrap().get(), 60);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml_str(
            r#"
            pod = "logging-mock-service-pod"
            namespace = "staging"
            container = "logging-mock-service"
            context = "kind-dev"
            tail_lines = 500
            follow = false
            summary_every = 10
            final_summary = true
            "#,
        )
        .unwrap();

        assert_eq!(config.pod.as_deref(), Some("logging-mock-service-pod"));
        assert_eq!(config.namespace, "staging");
        assert_eq!(config.container.as_deref(), Some("logging-mock-service"));
        assert_eq!(config.context.as_deref(), Some("kind-dev"));
        assert_eq!(config.summary_every, 10);
        assert!(config.final_summary);

        let options = config.tail_options();
        assert!(!options.follow);
        assert_eq!(options.tail_lines, Some(500));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::from_toml_str("tail = 5").is_err());
    }

    #[test]
    fn test_default_stream_matches_client_defaults() {
        let options = Config::default().tail_options();
        let expected = TailOptions::default();
        assert_eq!(options.follow, expected.follow);
        assert_eq!(options.tail_lines, expected.tail_lines);
        assert_eq!(options.tail_lines, Some(100));
    }

    #[test]
    fn test_negative_tail_means_whole_log() {
        let config = Config::from_toml_str("tail_lines = -1").unwrap();
        assert_eq!(config.tail_options().tail_lines, None);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate(false).is_err());
        assert!(config.validate(true).is_ok());

        config.pod = Some("api-0".to_string());
        assert!(config.validate(false).is_ok());

        config.summary_every = 0;
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file(Path::new("/nonexistent/levelwatch.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config file"));
    }
}
