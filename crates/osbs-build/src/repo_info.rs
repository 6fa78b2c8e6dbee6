use std::collections::BTreeMap;

use serde::Deserialize;

/// Labels with a well-known meaning in a Dockerfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelType {
    Component,
    Name,
    Version,
    Release,
}

impl LabelType {
    /// Accepted label names, current name first, then the legacy spelling.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::Component => &["com.redhat.component", "BZComponent"],
            Self::Name => &["name", "Name"],
            Self::Version => &["version", "Version"],
            Self::Release => &["release", "Release"],
        }
    }
}

/// Labels parsed from the repository's Dockerfile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DockerfileLabels {
    labels: BTreeMap<String, String>,
}

impl DockerfileLabels {
    pub fn new(labels: BTreeMap<String, String>) -> Self {
        Self { labels }
    }

    /// The label actually used for `label_type` and its value, if set.
    pub fn get_name_and_value(&self, label_type: LabelType) -> Option<(&str, &str)> {
        label_type.names().iter().find_map(|name| {
            self.labels
                .get_key_value(*name)
                .map(|(k, v)| (k.as_str(), v.as_str()))
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DockerfileLabels {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// `autorebuild` section of the repository's container.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AutorebuildConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub add_timestamp_to_release: bool,
}

/// What the build request needs to know about the source repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    pub autorebuild: AutorebuildConfig,
    pub labels: DockerfileLabels,
}

impl RepoInfo {
    pub fn new(autorebuild: AutorebuildConfig, labels: DockerfileLabels) -> Self {
        Self {
            autorebuild,
            labels,
        }
    }

    pub fn is_autorebuild_enabled(&self) -> bool {
        self.autorebuild.enabled
    }

    pub fn add_timestamp_to_release(&self) -> bool {
        self.autorebuild.add_timestamp_to_release
    }

    pub fn labels(&self) -> &DockerfileLabels {
        &self.labels
    }
}
