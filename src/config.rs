//! Configuration types for ole-unpack

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for one unpack run
///
/// Every field has a default, so an empty JSON object is a valid config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpackConfig {
    /// Suffix appended to a container's path to name its member directory (default: "-members")
    #[serde(default = "default_member_dir_suffix")]
    pub member_dir_suffix: String,

    /// File name of the JSON report written into the output directory (default: "ole.log")
    #[serde(default = "default_report_file_name")]
    pub report_file_name: String,

    /// Write the report at the end of a run (default: true)
    #[serde(default = "default_true")]
    pub write_report: bool,

    /// Permission bits for created member directories, Unix only (default: 0o770)
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,

    /// Number of leading bytes inspected when sniffing a file's type (default: 3072)
    #[serde(default = "default_classify_sample_len")]
    pub classify_sample_len: usize,
}

impl Default for UnpackConfig {
    fn default() -> Self {
        Self {
            member_dir_suffix: default_member_dir_suffix(),
            report_file_name: default_report_file_name(),
            write_report: true,
            dir_mode: default_dir_mode(),
            classify_sample_len: default_classify_sample_len(),
        }
    }
}

impl UnpackConfig {
    /// Load a config from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would break member path construction
    pub fn validate(&self) -> Result<()> {
        if self.member_dir_suffix.is_empty() {
            return Err(config_error(
                "member_dir_suffix must not be empty",
                "member_dir_suffix",
            ));
        }
        if self.member_dir_suffix.contains(['/', '\\']) {
            return Err(config_error(
                "member_dir_suffix must not contain a path separator",
                "member_dir_suffix",
            ));
        }
        if self.report_file_name.trim().is_empty() {
            return Err(config_error(
                "report_file_name must not be empty",
                "report_file_name",
            ));
        }
        if self.classify_sample_len == 0 {
            return Err(config_error(
                "classify_sample_len must be greater than zero",
                "classify_sample_len",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

fn default_member_dir_suffix() -> String {
    "-members".to_string()
}

fn default_report_file_name() -> String {
    "ole.log".to_string()
}

fn default_true() -> bool {
    true
}

fn default_dir_mode() -> u32 {
    0o770
}

fn default_classify_sample_len() -> usize {
    3072
}
