//! The optional per-project configuration file.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::{
    copy::{naming::DEFAULT_CLONE_SUFFIX, CopyOptions, DuplicatePolicy},
    host::DEFAULT_ASSET_DIR,
    rewrite::{RewriteErrorPolicy, DEFAULT_NULL_REFERENCE, DEFAULT_SCRIPT_MARKER},
    walk::{AssetFilter, DEFAULT_HIDDEN_PREFIX, DEFAULT_META_EXTENSION},
};

pub const CONFIG_FILE_NAME: &str = "assetclone.json5";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: JSON5 parse error", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: json5::Error,
    },

    #[error("the clone suffix must be non-empty and must not contain path separators, got {suffix:?}")]
    InvalidSuffix { suffix: String },

    #[error("the asset directory must be a non-empty relative path, got {asset_dir:?}")]
    InvalidAssetDir { asset_dir: String },

    #[error("unknown file log level {level:?}, expected none, error, warn, info, debug or trace")]
    InvalidLogLevel { level: String },
}

/// Settings read from `assetclone.json5`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Config {
    /// Directory below the project that holds the assets.
    pub asset_dir: String,

    /// Inserted into the name of every copied item.
    pub suffix: String,

    /// Extension of sidecar metadata files, without the dot.
    pub meta_extension: String,

    /// Names starting with this are hidden and never scanned.
    pub hidden_prefix: String,

    /// Lines containing this are never severed in safe copies.
    pub script_marker: String,

    /// What severed reference blocks are replaced with.
    pub null_reference: String,

    pub on_rewrite_error: RewriteErrorPolicy,

    pub duplicate_identifiers: DuplicatePolicy,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_dir: DEFAULT_ASSET_DIR.to_owned(),
            suffix: DEFAULT_CLONE_SUFFIX.to_owned(),
            meta_extension: DEFAULT_META_EXTENSION.to_owned(),
            hidden_prefix: DEFAULT_HIDDEN_PREFIX.to_owned(),
            script_marker: DEFAULT_SCRIPT_MARKER.to_owned(),
            null_reference: DEFAULT_NULL_REFERENCE.to_owned(),
            on_rewrite_error: RewriteErrorPolicy::default(),
            duplicate_identifiers: DuplicatePolicy::default(),
            file_log_level: None,
        }
    }
}

impl Config {
    /// Parses and validates configuration text. `path` is only used in errors.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = json5::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration file of the project in `project_dir`. A project
    /// without one gets the defaults.
    pub fn load(project_dir: &Path) -> Result<Self, ConfigError> {
        let path = project_dir.join(CONFIG_FILE_NAME);

        match fs_err::read_to_string(&path) {
            Ok(contents) => {
                log::debug!("Loading configuration from {}", path.display());
                Self::parse(&contents, &path)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.suffix.is_empty() || self.suffix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidSuffix {
                suffix: self.suffix.clone(),
            });
        }

        if self.asset_dir.is_empty()
            || self.asset_dir.starts_with(['/', '\\'])
            || Path::new(&self.asset_dir).is_absolute()
        {
            return Err(ConfigError::InvalidAssetDir {
                asset_dir: self.asset_dir.clone(),
            });
        }

        self.file_log_level()?;
        Ok(())
    }

    /// The level for the file log. `Ok(None)` means file logging is off, and
    /// an absent setting means everything is logged.
    pub fn file_log_level(&self) -> Result<Option<LevelFilter>, ConfigError> {
        let Some(level) = &self.file_log_level else {
            return Ok(Some(LevelFilter::TRACE));
        };

        parse_level(level).ok_or_else(|| ConfigError::InvalidLogLevel {
            level: level.clone(),
        })
    }

    pub fn filter(&self) -> AssetFilter {
        AssetFilter::new(&self.meta_extension, &self.hidden_prefix)
    }

    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            suffix: self.suffix.clone(),
            filter: self.filter(),
            script_marker: self.script_marker.clone(),
            null_reference: self.null_reference.clone(),
            on_rewrite_error: self.on_rewrite_error,
            duplicate_identifiers: self.duplicate_identifiers,
        }
    }
}

fn parse_level(level: &str) -> Option<Option<LevelFilter>> {
    Some(match level.to_lowercase().as_str() {
        "none" | "off" => None,
        "error" => Some(LevelFilter::ERROR),
        "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => return None,
    })
}
