// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ClientError;
use crate::labels::LabelSet;
use crate::level::Level;
use regex::Regex;
use reqwest::Url;
use std::time::Duration;

/// Label names accepted by the push endpoint.
pub const LABEL_NAME_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_]*$";

/// Capacity of the queue between producers and the delivery worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;

/// Wire encoding used for push requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// `application/json`, uncompressed.
    Json,
    /// Snappy-compressed protobuf, `application/x-protobuf`.
    #[default]
    Protobuf,
}

/// Settings for one [`crate::Client`], fixed for its lifetime.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Push endpoint, e.g. `http://localhost:3100/loki/api/v1/push`
    pub push_url: String,
    /// Labels applied to every stream
    pub labels: LabelSet,
    /// Longest time an entry waits before a forced flush
    pub batch_wait: Duration,
    /// Entry count that forces a flush
    pub batch_entries: usize,
    pub format: Format,
    pub queue_capacity: usize,
    /// Entries at least this severe are also written to the local log
    pub print_level: Option<Level>,
}

impl ClientConfig {
    #[must_use]
    pub fn new(
        push_url: impl Into<String>,
        labels: LabelSet,
        batch_wait: Duration,
        batch_entries: usize,
    ) -> Self {
        Self {
            push_url: push_url.into(),
            labels,
            batch_wait,
            batch_entries,
            format: Format::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            print_level: None,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    #[must_use]
    pub fn with_print_level(mut self, level: Level) -> Self {
        self.print_level = Some(level);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = Url::parse(&self.push_url).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid push URL '{}': {e}", self.push_url))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidConfig(format!(
                "Push URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.batch_entries == 0 {
            return Err(ClientError::InvalidConfig(
                "batch_entries must be greater than 0".to_string(),
            ));
        }

        if self.batch_wait.is_zero() {
            return Err(ClientError::InvalidConfig(
                "batch_wait must be greater than 0".to_string(),
            ));
        }

        if self.queue_capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        let label_name = Regex::new(LABEL_NAME_PATTERN).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid label name pattern: {e}"))
        })?;
        if let Some(name) = self.labels.names().find(|name| !label_name.is_match(name)) {
            return Err(ClientError::InvalidConfig(format!(
                "Invalid label name '{name}'. Must match [a-zA-Z_][a-zA-Z0-9_]*"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ClientConfig {
        ClientConfig::new(
            "http://localhost:3100/loki/api/v1/push",
            LabelSet::new().with("job", "somejob").with("source", "test"),
            Duration::from_secs(5),
            10_000,
        )
    }

    #[test]
    fn test_defaults() {
        let config = valid_config();
        assert_eq!(config.format, Format::Protobuf);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.print_level.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_url() {
        let mut config = valid_config();
        config.push_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.push_url = "ftp://localhost/push".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_limits() {
        let mut config = valid_config();
        config.batch_entries = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.batch_wait = Duration::ZERO;
        assert!(config.validate().is_err());

        let config = valid_config().with_queue_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_label_names() {
        let mut config = valid_config();
        config.labels.set("bad-name", "x");
        let error = config.validate().expect_err("label name should be rejected");
        assert!(error.to_string().contains("bad-name"));

        for name in ["job", "_private", "a1_b2"] {
            let mut config = valid_config();
            config.labels.set(name, "x");
            assert!(config.validate().is_ok(), "Label name '{}' should be valid", name);
        }

        for name in ["1job", "", "with space"] {
            let mut config = valid_config();
            config.labels.set(name, "x");
            assert!(config.validate().is_err(), "Label name '{}' should be invalid", name);
        }
    }

    #[test]
    fn test_label_name_pattern_compiles() {
        let pattern = Regex::new(LABEL_NAME_PATTERN).expect("pattern should compile");
        assert!(pattern.is_match("job"));
        assert!(!pattern.is_match("bad-name"));
    }

    #[test]
    fn test_builder_setters() {
        let config = valid_config()
            .with_format(Format::Json)
            .with_queue_capacity(10)
            .with_print_level(Level::Warning);
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.queue_capacity, 10);
        assert_eq!(config.print_level, Some(Level::Warning));
    }
}
