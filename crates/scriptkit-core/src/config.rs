use crate::error::Result;
use crate::paths;
use crate::template::TemplateKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ValidatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// More `console.log` lines than this produce a style warning.
    #[serde(default = "default_console_log_threshold")]
    pub console_log_threshold: usize,
}

fn default_console_log_threshold() -> usize {
    5
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            console_log_threshold: default_console_log_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Written into `// @author` of generated scripts when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Written into `// @namespace` of generated scripts when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub default_kind: TemplateKind,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_dir: Option<PathBuf>,
    /// Host used for the favicon URL when the match pattern's host is a wildcard.
    #[serde(default = "default_icon_host")]
    pub icon_default_host: String,
    #[serde(default)]
    pub validator: ValidatorConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_icon_host() -> String {
    "example.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author: None,
            namespace: None,
            default_kind: TemplateKind::default(),
            output_dir: default_output_dir(),
            templates_dir: None,
            icon_default_host: default_icon_host(),
            validator: ValidatorConfig::default(),
        }
    }
}

impl Config {
    /// Load `.scriptkit/config.yaml` under `root`, or defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Resolve a configured directory against the project root.
    pub fn resolve(&self, root: &Path, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            root.join(dir)
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Some(dir) = &self.templates_dir {
            let resolved = self.resolve(root, dir);
            if !resolved.is_dir() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "templates_dir '{}' does not exist",
                        resolved.display()
                    ),
                });
            } else {
                for kind in TemplateKind::all() {
                    if !resolved.join(kind.file_name()).is_file() {
                        warnings.push(ConfigWarning {
                            level: WarnLevel::Warning,
                            message: format!(
                                "templates_dir has no {} (generating '{}' will fail)",
                                kind.file_name(),
                                kind
                            ),
                        });
                    }
                }
            }
        }

        let host = self.icon_default_host.trim();
        if host.is_empty() || host.contains(['*', '/']) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "icon_default_host '{}' must be a plain host name",
                    self.icon_default_host
                ),
            });
        }

        if self.validator.console_log_threshold == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "validator.console_log_threshold is 0: any console.log will warn"
                    .to_string(),
            });
        }

        warnings
    }
}
