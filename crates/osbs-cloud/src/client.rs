use std::collections::BTreeMap;

use osbs_core::ClusterConfig;
use serde::Deserialize;
use serde_json::Value;

use crate::executor::{OcExecutor, RealExecutor};
use crate::oc::OcError;

/// The slice of the OpenShift API a build request needs while rendering.
pub trait OpenShiftApi {
    /// Fetch a config map by name.
    fn get_config_map(&self, name: &str) -> Result<ConfigMap, ApiError>;
}

/// A fetched config map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMap {
    name: String,
    data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn new(name: impl Into<String>, data: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    /// Parse the value stored under `key`.
    ///
    /// The format follows the key's extension: `.yaml`/`.yml` values are
    /// parsed as YAML, `.json` values as JSON.
    pub fn get_data_by_key(&self, key: &str) -> Result<Value, ApiError> {
        let raw = self.data.get(key).ok_or_else(|| ApiError::MissingKey {
            config_map: self.name.clone(),
            key: key.to_owned(),
        })?;

        if key.ends_with(".yaml") || key.ends_with(".yml") {
            serde_yaml::from_str(raw).map_err(|e| ApiError::InvalidYaml {
                key: key.to_owned(),
                source: e,
            })
        } else if key.ends_with(".json") {
            serde_json::from_str(raw).map_err(|e| ApiError::InvalidJson {
                key: key.to_owned(),
                source: e,
            })
        } else {
            Err(ApiError::UnsupportedFormat {
                key: key.to_owned(),
            })
        }
    }
}

#[derive(Deserialize)]
struct ConfigMapResponse {
    metadata: ResponseMetadata,
    #[serde(default)]
    data: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct ResponseMetadata {
    name: String,
}

/// OpenShift client backed by the `oc` CLI, parameterized over the executor
/// for testability.
pub struct OcClient<E: OcExecutor = RealExecutor> {
    executor: E,
    namespace: Option<String>,
}

impl OcClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::default(),
            namespace: None,
        }
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self {
            executor: RealExecutor::new(config.oc_binary.clone()),
            namespace: config.namespace.clone(),
        }
    }
}

impl Default for OcClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: OcExecutor> OcClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            executor,
            namespace: None,
        }
    }

    /// Query `namespace` instead of the current project.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl<E: OcExecutor> OpenShiftApi for OcClient<E> {
    fn get_config_map(&self, name: &str) -> Result<ConfigMap, ApiError> {
        let mut cmd = args(["get", "configmap", name, "-o", "json"]);
        if let Some(ns) = &self.namespace {
            cmd.extend(args(["--namespace", ns.as_str()]));
        }

        let output = self.executor.exec(&cmd)?;
        let response: ConfigMapResponse =
            serde_json::from_str(&output).map_err(|e| ApiError::InvalidResponse {
                name: name.to_owned(),
                source: e,
            })?;

        tracing::debug!(
            config_map = %response.metadata.name,
            keys = response.data.len(),
            "fetched config map"
        );
        Ok(ConfigMap::new(response.metadata.name, response.data))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Oc(#[from] OcError),

    #[error("unexpected response for config map {name}")]
    InvalidResponse {
        name: String,
        source: serde_json::Error,
    },

    #[error("config map {config_map} has no key {key:?}")]
    MissingKey { config_map: String, key: String },

    #[error("config map key {key:?} is neither .json nor .yaml")]
    UnsupportedFormat { key: String },

    #[error("config map key {key:?} does not hold valid YAML")]
    InvalidYaml {
        key: String,
        source: serde_yaml::Error,
    },

    #[error("config map key {key:?} does not hold valid JSON")]
    InvalidJson {
        key: String,
        source: serde_json::Error,
    },
}

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
