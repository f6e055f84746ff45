//! Picker configuration stored in `picker.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::classifier::OutcomeMarkers;
use crate::core::report::DisplayConfig;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "picker.toml";
pub const DEFAULT_RANGE: &str = "Tracking!A1:J";

/// Picker configuration (TOML).
///
/// Every field may be omitted; required inputs are enforced by
/// [`PickerConfig::resolve`] after command-line and environment overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PickerConfig {
    /// Working tree that receives the cherry-picks.
    pub repo_path: Option<PathBuf>,

    /// Where tracking rows come from.
    pub source: Option<SourceConfig>,

    pub git: GitConfig,

    pub display: DisplayConfig,
}

/// Tracking data source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// JSON file in the Sheets `ValueRange` shape.
    File { path: PathBuf },
    /// Google Sheets values API.
    Sheets {
        spreadsheet_id: String,
        #[serde(default = "default_range")]
        range: String,
        /// File holding an OAuth bearer token.
        #[serde(default)]
        credentials_path: Option<PathBuf>,
    },
}

fn default_range() -> String {
    DEFAULT_RANGE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GitConfig {
    /// Upper bound on each git invocation.
    pub timeout_secs: u64,

    /// Truncate captured git stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// minijinja template for the history reference of an entry.
    pub reference_template: String,

    /// Regex patterns marking a conflicted cherry-pick.
    pub conflict_markers: Vec<String>,

    /// Regex patterns marking a cherry-pick with nothing to commit.
    pub no_op_markers: Vec<String>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            output_limit_bytes: 1_000_000,
            reference_template: "(#{{ identifier }})".to_string(),
            conflict_markers: vec!["CONFLICT".to_string()],
            no_op_markers: vec![
                "nothing to commit, working tree clean".to_string(),
                "The previous cherry-pick is now empty".to_string(),
            ],
        }
    }
}

/// Values supplied outside the config file (flags or environment).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo_path: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
}

/// Fully validated configuration handed to the commands.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub repo_path: PathBuf,
    pub source: SourceConfig,
    pub git: GitConfig,
    pub display: DisplayConfig,
}

impl PickerConfig {
    /// Resolve relative source paths from the config file against `base_dir`.
    ///
    /// Call before [`PickerConfig::resolve`] so that override paths (flags,
    /// environment) stay relative to the working directory.
    pub fn anchor_paths(mut self, base_dir: &Path) -> Self {
        match &mut self.source {
            Some(SourceConfig::File { path }) => *path = base_dir.join(&*path),
            Some(SourceConfig::Sheets {
                credentials_path: Some(path),
                ..
            }) => *path = base_dir.join(&*path),
            _ => {}
        }
        self
    }

    /// Apply overrides, check required settings and validate the rest.
    pub fn resolve(self, overrides: Overrides) -> Result<ResolvedConfig, ConfigError> {
        let repo_path = overrides
            .repo_path
            .or(self.repo_path)
            .ok_or(ConfigError::Missing {
                key: "repo_path",
                hint: "set repo_path in picker.toml or export PICKER_REPO",
            })?;

        let mut source = self.source.ok_or(ConfigError::Missing {
            key: "source",
            hint: "add a [source] table to picker.toml",
        })?;
        if let SourceConfig::Sheets {
            credentials_path, ..
        } = &mut source
        {
            if overrides.credentials_path.is_some() {
                *credentials_path = overrides.credentials_path;
            }
            if credentials_path.is_none() {
                return Err(ConfigError::Missing {
                    key: "source.credentials_path",
                    hint: "set it in picker.toml or export PICKER_CREDENTIALS",
                });
            }
        }

        validate_git(&self.git)?;
        validate_display(&self.display)?;

        Ok(ResolvedConfig {
            repo_path,
            source,
            git: self.git,
            display: self.display,
        })
    }
}

fn validate_git(git: &GitConfig) -> Result<(), ConfigError> {
    if git.timeout_secs == 0 {
        return Err(invalid("git.timeout_secs", "must be > 0"));
    }
    if git.output_limit_bytes == 0 {
        return Err(invalid("git.output_limit_bytes", "must be > 0"));
    }
    if git.conflict_markers.is_empty() {
        return Err(invalid("git.conflict_markers", "must not be empty"));
    }
    if let Err(err) = OutcomeMarkers::compile(&git.conflict_markers, &git.no_op_markers) {
        return Err(ConfigError::Invalid {
            key: "git markers",
            reason: format!("{err:#}"),
        });
    }
    if let Err(err) = minijinja::Environment::new().template_from_str(&git.reference_template) {
        return Err(ConfigError::Invalid {
            key: "git.reference_template",
            reason: err.to_string(),
        });
    }
    Ok(())
}

fn validate_display(display: &DisplayConfig) -> Result<(), ConfigError> {
    if display.listing_title_width == 0 {
        return Err(invalid("display.listing_title_width", "must be > 0"));
    }
    if display.progress_title_width == 0 {
        return Err(invalid("display.progress_title_width", "must be > 0"));
    }
    if display.hash_width == 0 {
        return Err(invalid("display.hash_width", "must be > 0"));
    }
    Ok(())
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PickerConfig::default()`.
pub fn load_config(path: &Path) -> Result<PickerConfig> {
    if !path.exists() {
        return Ok(PickerConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PickerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> PickerConfig {
        PickerConfig {
            repo_path: Some(PathBuf::from("/srv/app")),
            source: Some(SourceConfig::File {
                path: PathBuf::from("tracking.json"),
            }),
            ..PickerConfig::default()
        }
    }

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, PickerConfig::default());
    }

    #[test]
    fn parses_sheets_source_with_default_range() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("picker.toml");
        fs::write(
            &path,
            r#"
repo_path = "/srv/app"

[source]
kind = "sheets"
spreadsheet_id = "sheet-123"

[display]
hash_width = 7
"#,
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(
            cfg.source,
            Some(SourceConfig::Sheets {
                spreadsheet_id: "sheet-123".to_string(),
                range: DEFAULT_RANGE.to_string(),
                credentials_path: None,
            })
        );
        assert_eq!(cfg.display.hash_width, 7);
        assert_eq!(cfg.display.listing_title_width, 50);
        assert_eq!(cfg.git, GitConfig::default());
    }

    #[test]
    fn missing_repo_path_is_configuration_error() {
        let cfg = PickerConfig {
            repo_path: None,
            ..file_config()
        };
        let err = cfg.resolve(Overrides::default()).expect_err("missing repo");
        assert!(matches!(err, ConfigError::Missing { key: "repo_path", .. }));
    }

    #[test]
    fn override_repo_path_wins() {
        let resolved = file_config()
            .resolve(Overrides {
                repo_path: Some(PathBuf::from("/other")),
                credentials_path: None,
            })
            .expect("resolve");
        assert_eq!(resolved.repo_path, PathBuf::from("/other"));
    }

    #[test]
    fn sheets_source_requires_credentials() {
        let cfg = PickerConfig {
            source: Some(SourceConfig::Sheets {
                spreadsheet_id: "id".to_string(),
                range: DEFAULT_RANGE.to_string(),
                credentials_path: None,
            }),
            ..file_config()
        };
        let err = cfg
            .clone()
            .resolve(Overrides::default())
            .expect_err("missing credentials");
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "source.credentials_path",
                ..
            }
        ));

        let resolved = cfg
            .resolve(Overrides {
                repo_path: None,
                credentials_path: Some(PathBuf::from("/secrets/token")),
            })
            .expect("resolve with env credentials");
        assert!(matches!(
            resolved.source,
            SourceConfig::Sheets {
                credentials_path: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn file_paths_anchor_to_config_dir_but_overrides_do_not() {
        let base = Path::new("/etc/picker");
        let anchored = file_config().anchor_paths(base);
        assert_eq!(
            anchored.source,
            Some(SourceConfig::File {
                path: PathBuf::from("/etc/picker/tracking.json"),
            })
        );

        let sheets = PickerConfig {
            source: Some(SourceConfig::Sheets {
                spreadsheet_id: "id".to_string(),
                range: DEFAULT_RANGE.to_string(),
                credentials_path: Some(PathBuf::from("token")),
            }),
            ..file_config()
        };
        let from_file = sheets
            .clone()
            .anchor_paths(base)
            .resolve(Overrides::default())
            .expect("resolve");
        assert!(matches!(
            from_file.source,
            SourceConfig::Sheets { credentials_path: Some(ref p), .. } if p == Path::new("/etc/picker/token")
        ));

        let from_env = sheets
            .anchor_paths(base)
            .resolve(Overrides {
                repo_path: None,
                credentials_path: Some(PathBuf::from("local/token")),
            })
            .expect("resolve");
        assert!(matches!(
            from_env.source,
            SourceConfig::Sheets { credentials_path: Some(ref p), .. } if p == Path::new("local/token")
        ));
    }

    #[test]
    fn invalid_marker_is_rejected() {
        let mut cfg = file_config();
        cfg.git.conflict_markers = vec!["[unclosed".to_string()];
        let err = cfg.resolve(Overrides::default()).expect_err("bad marker");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = file_config();
        cfg.git.timeout_secs = 0;
        let err = cfg.resolve(Overrides::default()).expect_err("zero timeout");
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "git.timeout_secs",
                reason: "must be > 0".to_string(),
            }
        );
    }
}
