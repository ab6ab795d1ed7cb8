//! Runtime configuration.
//!
//! Every tunable comes from the environment exactly once, at process start.
//! Components receive a reference to the parsed [`OpenbookConfig`] and never
//! re-read environment variables afterwards. In particular the media storage
//! backend is resolved from `environment` a single time, so flipping the
//! variable requires a process restart.

use serde::Deserialize;
use std::path::PathBuf;

/// Media content types accepted for uploads.
pub const SUPPORTED_MEDIA_MIMETYPES: [&str; 5] = [
    "video/mp4",
    "video/3gpp",
    "image/gif",
    "image/jpeg",
    "image/png",
];

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    #[must_use]
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    #[must_use]
    pub fn is_test(self) -> bool {
        self == Environment::Test
    }
}

/// Immutable process-wide configuration, deserialized from the environment
/// with [`envy`](https://docs.rs/envy) by the binaries.
#[derive(Clone, Eq, PartialEq, Debug, Deserialize)]
pub struct OpenbookConfig {
    pub environment: Environment,
    pub database_url: String,

    #[serde(default = "default_post_max_length")]
    pub post_max_length: usize,
    #[serde(default = "default_post_comment_max_length")]
    pub post_comment_max_length: usize,
    #[serde(default = "default_post_image_max_size")]
    pub post_image_max_size: u64,
    #[serde(default = "default_hide_content_after_reports_amount")]
    pub global_hide_content_after_reports_amount: u32,

    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    #[serde(default)]
    pub aws_storage_bucket_name: Option<String>,
    #[serde(default)]
    pub aws_private_media_location: Option<String>,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    #[serde(default)]
    pub service_email_address: Option<String>,
}

impl OpenbookConfig {
    #[must_use]
    pub fn is_supported_media_type(content_type: &str) -> bool {
        SUPPORTED_MEDIA_MIMETYPES.contains(&content_type)
    }

    /// Baseline configuration with every tunable at its default, for tests
    /// and tools that do not read the environment.
    #[must_use]
    pub fn with_defaults(environment: Environment, database_url: String) -> Self {
        Self {
            environment,
            database_url,
            post_max_length: default_post_max_length(),
            post_comment_max_length: default_post_comment_max_length(),
            post_image_max_size: default_post_image_max_size(),
            global_hide_content_after_reports_amount: default_hide_content_after_reports_amount(),
            media_root: default_media_root(),
            aws_storage_bucket_name: None,
            aws_private_media_location: None,
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            service_email_address: None,
        }
    }
}

fn default_post_max_length() -> usize {
    5000
}

fn default_post_comment_max_length() -> usize {
    1500
}

fn default_post_image_max_size() -> u64 {
    10_485_760
}

fn default_hide_content_after_reports_amount() -> u32 {
    20
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_smtp_host() -> String {
    "localhost".to_owned()
}

fn default_smtp_port() -> u16 {
    587
}

#[cfg(test)]
mod tests {
    use crate::config::{Environment, OpenbookConfig};

    #[test]
    fn supported_media_types() {
        for supported in ["image/png", "image/jpeg", "image/gif", "video/mp4", "video/3gpp"] {
            assert!(OpenbookConfig::is_supported_media_type(supported));
        }
        for unsupported in ["image/bmp", "video/webm", "application/pdf", ""] {
            assert!(!OpenbookConfig::is_supported_media_type(unsupported));
        }
    }

    #[test]
    fn environment_flags() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
        assert!(!Environment::Test.is_production());
        assert!(Environment::Test.is_test());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config =
            OpenbookConfig::with_defaults(Environment::Development, "postgres://".to_owned());
        assert_eq!(config.post_max_length, 5000);
        assert_eq!(config.post_comment_max_length, 1500);
        assert_eq!(config.post_image_max_size, 10_485_760);
        assert_eq!(config.global_hide_content_after_reports_amount, 20);
        assert_eq!(config.smtp_port, 587);
    }
}
