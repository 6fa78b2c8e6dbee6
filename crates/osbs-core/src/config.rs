use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// osbs.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsbsConfig {
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub build: BuildDefaults,
    #[serde(default)]
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding the JSON build templates
    #[serde(default = "default_build_json_dir")]
    pub build_json_dir: PathBuf,
    /// Outer template for regular image builds
    #[serde(default = "default_outer_template")]
    pub outer_template: String,
    /// Outer template for source container builds
    #[serde(default = "default_sources_outer_template")]
    pub sources_outer_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDefaults {
    /// Directory under which required secrets are mounted in the build pod
    #[serde(default = "default_secrets_path")]
    pub secrets_path: String,
    /// Regular expression an isolated build's release must match
    #[serde(default = "default_isolated_release_format")]
    pub isolated_release_format: String,
    /// Key of the reactor config inside its config map
    #[serde(default = "default_reactor_config_key")]
    pub reactor_config_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Namespace to query; `oc` uses the current project when unset
    pub namespace: Option<String>,
    /// Path or name of the `oc` binary
    #[serde(default = "default_oc_binary")]
    pub oc_binary: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            build_json_dir: default_build_json_dir(),
            outer_template: default_outer_template(),
            sources_outer_template: default_sources_outer_template(),
        }
    }
}

impl Default for BuildDefaults {
    fn default() -> Self {
        Self {
            secrets_path: default_secrets_path(),
            isolated_release_format: default_isolated_release_format(),
            reactor_config_key: default_reactor_config_key(),
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            oc_binary: default_oc_binary(),
        }
    }
}

impl OsbsConfig {
    /// Load from osbs.toml at the given path, or return defaults if not found.
    pub fn load(dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = dir.join("osbs.toml");
        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading osbs config");
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })
        } else {
            Ok(Self::default())
        }
    }
}

fn default_build_json_dir() -> PathBuf {
    PathBuf::from("inputs")
}

fn default_outer_template() -> String {
    crate::DEFAULT_OUTER_TEMPLATE.to_owned()
}

fn default_sources_outer_template() -> String {
    crate::DEFAULT_SOURCES_OUTER_TEMPLATE.to_owned()
}

fn default_secrets_path() -> String {
    crate::SECRETS_PATH.to_owned()
}

fn default_isolated_release_format() -> String {
    crate::ISOLATED_RELEASE_FORMAT.to_owned()
}

fn default_reactor_config_key() -> String {
    crate::REACTOR_CONFIG_KEY.to_owned()
}

fn default_oc_binary() -> String {
    "oc".to_owned()
}
