//! Reactor configuration: how it is handed to the build and what the
//! request builder reads back from it.

use osbs_cloud::OpenShiftApi;
use osbs_core::CommonParams;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::document::EnvVar;
use crate::error::RenderError;

/// Env entry the build reads its reactor configuration from.
pub const REACTOR_CONFIG_ENV: &str = "REACTOR_CONFIG";

/// The parts of atomic-reactor's configuration a build request needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReactorConfig {
    #[serde(default)]
    pub source_registry: Option<SourceRegistry>,
    #[serde(default)]
    pub registries_organization: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub required_secrets: Vec<String>,
    /// Secrets orchestrator builds need to talk to worker clusters
    #[serde(default, deserialize_with = "null_as_empty")]
    pub worker_token_secrets: Vec<String>,
    #[serde(default)]
    pub flatpak: Option<FlatpakConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceRegistry {
    pub url: String,
    #[serde(default)]
    pub insecure: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FlatpakConfig {
    #[serde(default)]
    pub base_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReactorConfig {
    /// Interpret raw configuration data; `null` is an empty configuration.
    pub fn from_value(value: Value) -> Result<Self, RenderError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| RenderError::ReactorConfigShape { source: e })
    }

    pub fn flatpak_base_image(&self) -> Option<&str> {
        self.flatpak
            .as_ref()
            .and_then(|f| f.base_image.as_deref())
            .filter(|image| !image.is_empty())
    }

    /// Secrets to mount; worker token secrets are included on request.
    pub fn secrets(&self, with_worker_tokens: bool) -> impl Iterator<Item = &str> {
        let tokens = self
            .worker_token_secrets
            .iter()
            .filter(move |_| with_worker_tokens);
        self.required_secrets
            .iter()
            .chain(tokens)
            .map(String::as_str)
    }
}

/// `REACTOR_CONFIG` env entry for the build, if any configuration was given.
///
/// An inline override is dumped as YAML and wins over a config map
/// reference.
pub fn reactor_config_env(
    params: &CommonParams,
    config_map_key: &str,
) -> Result<Option<EnvVar>, RenderError> {
    if let Some(config) = inline_override(params) {
        let yaml =
            serde_yaml::to_string(config).map_err(|e| RenderError::SerializeYaml { source: e })?;
        return Ok(Some(EnvVar::value(REACTOR_CONFIG_ENV, yaml)));
    }
    Ok(params
        .reactor_config_map
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| EnvVar::from_config_map(REACTOR_CONFIG_ENV, name, config_map_key)))
}

/// Reactor configuration data: the inline override, or the config map
/// fetched through `api`. Empty when neither is set.
pub fn fetch_reactor_config(
    params: &CommonParams,
    api: &dyn OpenShiftApi,
    config_map_key: &str,
) -> Result<ReactorConfig, RenderError> {
    if let Some(config) = inline_override(params) {
        return ReactorConfig::from_value(Value::Object(config.clone()));
    }
    let Some(name) = params.reactor_config_map.as_deref().filter(|n| !n.is_empty()) else {
        return Ok(ReactorConfig::default());
    };

    let to_error = |e| RenderError::ReactorConfigMap {
        name: name.to_owned(),
        source: e,
    };
    let data = api
        .get_config_map(name)
        .and_then(|cm| cm.get_data_by_key(config_map_key))
        .map_err(to_error)?;
    ReactorConfig::from_value(data)
}

/// A key given without a value (`required_secrets:` in YAML) is an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn inline_override(params: &CommonParams) -> Option<&Map<String, Value>> {
    params
        .reactor_config_override
        .as_ref()
        .filter(|config| !config.is_empty())
}
