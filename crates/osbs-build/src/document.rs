//! Typed view of an OpenShift Build/BuildConfig object.
//!
//! Only the fields the render pipeline reads or writes are typed. Everything
//! else in the template is carried through untouched in the flattened
//! `extra` maps, so unknown template content survives a load/render cycle.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Env entry atomic-reactor reads its plugin configuration from; templates
/// ship an empty placeholder for it.
pub const ATOMIC_REACTOR_PLUGINS: &str = "ATOMIC_REACTOR_PLUGINS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildDocument {
    pub metadata: Metadata,
    pub spec: BuildSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<BuildSource>,
    pub strategy: Strategy,
    pub output: Output,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<Trigger>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_deadline_seconds: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategy {
    pub custom_strategy: CustomStrategy,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStrategy {
    pub from: ObjectReference,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<SecretMount>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{kind, name}` reference to an image, image stream tag, or similar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub to: ObjectReference,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default)]
    pub limits: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    pub fn from_config_map(
        name: impl Into<String>,
        config_map: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                config_map_key_ref: Some(ConfigMapKeySelector {
                    name: config_map.into(),
                    key: key.into(),
                }),
                extra: Map::new(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<ConfigMapKeySelector>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMapKeySelector {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMount {
    pub secret_source: SecretSource,
    #[serde(default)]
    pub mount_path: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretSource {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_change: Option<ImageChangeTrigger>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trigger {
    /// Whether this is an `ImageChange` trigger watching an image stream tag.
    pub fn is_image_stream_tag_change(&self) -> bool {
        self.kind == "ImageChange"
            && self
                .image_change
                .as_ref()
                .and_then(|ic| ic.from.as_ref())
                .and_then(|from| from.kind.as_deref())
                == Some("ImageStreamTag")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageChangeTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ObjectReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildDocument {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn labels(&self) -> Option<&BTreeMap<String, String>> {
        self.metadata.labels.as_ref()
    }

    /// Set a label, creating the label map if the template had none.
    /// The value is stored as given; callers sanitize.
    pub fn set_label(&mut self, name: &str, value: String) {
        self.metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_owned(), value);
    }

    pub fn custom_strategy(&self) -> &CustomStrategy {
        &self.spec.strategy.custom_strategy
    }

    pub fn custom_strategy_mut(&mut self) -> &mut CustomStrategy {
        &mut self.spec.strategy.custom_strategy
    }

    pub fn env(&self, name: &str) -> Option<&EnvVar> {
        self.custom_strategy().env.iter().find(|e| e.name == name)
    }

    pub fn push_env(&mut self, env: EnvVar) {
        self.custom_strategy_mut().env.push(env);
    }

    /// Remove the first env entry called `name`. Returns whether one was removed.
    pub fn remove_env(&mut self, name: &str) -> bool {
        let env = &mut self.custom_strategy_mut().env;
        match env.iter().position(|e| e.name == name) {
            Some(index) => {
                env.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn has_triggers(&self) -> bool {
        self.spec.triggers.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Drop all trigger definitions. Returns whether any were present.
    pub fn remove_triggers(&mut self) -> bool {
        self.spec.triggers.take().is_some()
    }

    /// Whether the build has an image-change trigger on an image stream tag.
    pub fn has_ist_trigger(&self) -> bool {
        self.spec
            .triggers
            .iter()
            .flatten()
            .any(Trigger::is_image_stream_tag_change)
    }

    /// Point the image stream tag trigger at `tag`.
    pub fn set_ist_trigger_tag(&mut self, tag: &str) {
        let trigger = self
            .spec
            .triggers
            .iter_mut()
            .flatten()
            .find(|t| t.is_image_stream_tag_change());
        if let Some(from) = trigger
            .and_then(|t| t.image_change.as_mut())
            .and_then(|ic| ic.from.as_mut())
        {
            from.name = tag.to_owned();
        }
    }

    /// Names of the secrets already mounted into the build.
    pub fn mounted_secrets(&self) -> HashSet<&str> {
        self.custom_strategy()
            .secrets
            .iter()
            .flatten()
            .map(|s| s.secret_source.name.as_str())
            .collect()
    }

    /// Mount each secret in `names` that is not mounted yet under
    /// `<secrets_path>/<name>`. Returns the names that were added.
    pub fn add_secrets<'a, I>(&mut self, names: I, secrets_path: &str) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut present: HashSet<String> = self
            .mounted_secrets()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let secrets = self.custom_strategy_mut().secrets.get_or_insert_with(Vec::new);

        let mut added = Vec::new();
        for name in names {
            if !present.insert(name.to_owned()) {
                tracing::debug!(secret = name, "secret is already set");
                continue;
            }
            let mount_path = format!("{}/{name}", secrets_path.trim_end_matches('/'));
            tracing::info!(secret = name, path = %mount_path, "configuring secret");
            secrets.push(SecretMount {
                secret_source: SecretSource {
                    name: name.to_owned(),
                    extra: Map::new(),
                },
                mount_path,
                extra: Map::new(),
            });
            added.push(name.to_owned());
        }
        added
    }

    /// Merge `limits` into `spec.resources.limits`, overwriting per key.
    pub fn merge_resource_limits<I>(&mut self, limits: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.spec
            .resources
            .get_or_insert_with(Resources::default)
            .limits
            .extend(limits);
    }

    /// Set the git source, creating `spec.source.git` if needed.
    pub fn set_git_source(&mut self, uri: Option<String>, git_ref: Option<String>) {
        let git = self
            .spec
            .source
            .get_or_insert_with(BuildSource::default)
            .git
            .get_or_insert_with(GitSource::default);
        git.uri = uri;
        git.git_ref = git_ref;
    }

    /// Set the completion deadline from hours; zero or negative leaves it unset.
    /// Deadlines too large to express in seconds are capped at `u64::MAX`.
    pub fn set_deadline_hours(&mut self, hours: i64) {
        if hours <= 0 {
            return;
        }
        let seconds = hours.unsigned_abs().saturating_mul(3600);
        self.spec.completion_deadline_seconds = Some(seconds);
        tracing::info!(hours, seconds, "setting completion deadline");
    }
}
