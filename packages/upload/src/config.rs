//! Upload configuration
//!
//! Loaded as part of `folio.config.json` by the CLI; every field has a
//! default so an empty object is a valid config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    /// Tasks allowed in compressing/uploading/validating at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Byte cap per file (`None` disables the cap)
    #[serde(default = "default_max_size")]
    pub max_size: Option<u64>,

    /// Downscale/re-encode oversized files instead of rejecting them
    #[serde(default)]
    pub force_reduce_size: bool,

    /// Comma separated mime patterns or extensions (`image/*,.svg`)
    #[serde(default = "default_accept")]
    pub accept: String,

    /// Document-wide cap on embed nodes
    #[serde(default)]
    pub max_embeddings: Option<usize>,

    /// Files taken from one drop/paste/picker gesture
    #[serde(default = "default_max_files_per_drop")]
    pub max_files_per_drop: usize,

    /// Hard timeout for the post-upload reference probe
    #[serde(default = "default_validation_timeout_ms")]
    pub validation_timeout_ms: u64,
}

fn default_max_concurrent() -> usize {
    3
}

fn default_max_size() -> Option<u64> {
    Some(DEFAULT_MAX_SIZE)
}

fn default_accept() -> String {
    "image/*".to_string()
}

fn default_max_files_per_drop() -> usize {
    3
}

fn default_validation_timeout_ms() -> u64 {
    5000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            max_size: default_max_size(),
            force_reduce_size: false,
            accept: default_accept(),
            max_embeddings: None,
            max_files_per_drop: default_max_files_per_drop(),
            validation_timeout_ms: default_validation_timeout_ms(),
        }
    }
}

impl QueueConfig {
    pub fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    /// Constraints applied to tasks that don't carry their own
    pub fn constraints(&self) -> UploadConstraints {
        UploadConstraints {
            max_size: self.max_size,
            force_reduce: self.force_reduce_size,
            accept: AcceptPattern::parse(&self.accept),
        }
    }
}

/// Per-task admission and preprocessing limits
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConstraints {
    pub max_size: Option<u64>,
    pub force_reduce: bool,
    pub accept: AcceptPattern,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        QueueConfig::default().constraints()
    }
}

/// Parsed `accept` attribute: mime types, `type/*` wildcards and `.ext` suffixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptPattern {
    rules: Vec<AcceptRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AcceptRule {
    Any,
    Exact(String),
    TopLevel(String),
    Extension(String),
}

impl AcceptPattern {
    pub fn parse(pattern: &str) -> Self {
        let rules = pattern
            .split(',')
            .map(|part| part.trim().to_ascii_lowercase())
            .filter(|part| !part.is_empty())
            .map(|part| {
                if part == "*" || part == "*/*" {
                    AcceptRule::Any
                } else if let Some(ext) = part.strip_prefix('.') {
                    AcceptRule::Extension(ext.to_string())
                } else if let Some(top) = part.strip_suffix("/*") {
                    AcceptRule::TopLevel(top.to_string())
                } else {
                    AcceptRule::Exact(part)
                }
            })
            .collect();

        Self { rules }
    }

    pub fn any() -> Self {
        Self {
            rules: vec![AcceptRule::Any],
        }
    }

    /// An empty pattern accepts everything
    pub fn matches(&self, mime: &str, file_name: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }

        let mime = mime.to_ascii_lowercase();
        let top_level = mime.split('/').next().unwrap_or_default();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        self.rules.iter().any(|rule| match rule {
            AcceptRule::Any => true,
            AcceptRule::Exact(m) => *m == mime,
            AcceptRule::TopLevel(t) => t == top_level,
            AcceptRule::Extension(e) => extension.as_deref() == Some(e.as_str()),
        })
    }
}

impl Default for AcceptPattern {
    fn default() -> Self {
        Self::parse(&default_accept())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());
        assert_eq!(config.max_concurrent, 3);
        assert_eq!(config.max_size, Some(5 * 1024 * 1024));
        assert_eq!(config.validation_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_camel_case_fields() {
        let config: QueueConfig = serde_json::from_str(
            r#"{"maxConcurrent": 2, "forceReduceSize": true, "maxSize": null, "maxEmbeddings": 10}"#,
        )
        .unwrap();
        assert_eq!(config.max_concurrent, 2);
        assert!(config.force_reduce_size);
        assert_eq!(config.max_size, None);
        assert_eq!(config.max_embeddings, Some(10));
    }

    #[test]
    fn test_accept_pattern() {
        let accept = AcceptPattern::parse("image/*, application/pdf, .SVG");
        assert!(accept.matches("image/png", "a.png"));
        assert!(accept.matches("application/pdf", "doc.pdf"));
        assert!(accept.matches("application/octet-stream", "logo.svg"));
        assert!(!accept.matches("text/plain", "notes.txt"));
        assert!(!accept.matches("imagery/png", "x"));
    }

    #[test]
    fn test_empty_accept_matches_everything() {
        assert!(AcceptPattern::parse("").matches("text/plain", "a.txt"));
        assert!(AcceptPattern::any().matches("video/mp4", "a.mp4"));
    }
}
