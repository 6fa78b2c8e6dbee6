//! User parameter sets for build requests.
//!
//! Parameters arrive from the caller (usually as JSON), are validated once,
//! and are then read-only. The whole set is serialized back into the build
//! as the `USER_PARAMS` environment variable, so unset optional values are
//! skipped during serialization.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::labels::{LABEL_MAX_CHARS, git_repo_humanish_part, sanitize_name};
use crate::{Error, Result};

/// DNS-1123 subdomain
static OBJECT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9.]*[a-z0-9])?$").expect("object name pattern compiles")
});

/// Role of the build in an orchestrated multi-platform build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    #[default]
    Orchestrator,
    Worker,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orchestrator => f.write_str("orchestrator"),
            Self::Worker => f.write_str("worker"),
        }
    }
}

/// Contract every user parameter set fulfils.
pub trait UserParams {
    /// Checks required values and value formats.
    fn validate(&self) -> Result<()>;

    /// Parameters shared by every kind of build.
    fn common(&self) -> &CommonParams;

    /// Serializes the parameter set, skipping unset values.
    fn to_json(&self) -> serde_json::Result<String>;
}

/// Parameters shared by image and source container builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Output image tag, `<user>/<component>:<prefix>-<salt>-<timestamp>[-<platform>]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub build_type: BuildType,
    /// Buildroot image for the custom strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_image: Option<String>,
    /// Buildroot image stream tag; preferred over `build_image` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_imagestream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub koji_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub koji_task_id: Option<u64>,
    /// Name of the config map holding the reactor configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactor_config_map: Option<String>,
    /// Inline reactor configuration; wins over `reactor_config_map`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactor_config_override: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_intent: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub scratch: bool,
}

impl CommonParams {
    fn validate(&self) -> Result<()> {
        require("user", self.user.as_deref())?;
        require("component", self.component.as_deref())?;
        require("image_tag", self.image_tag.as_deref())?;

        if is_blank(self.build_image.as_deref()) && is_blank(self.build_imagestream.as_deref()) {
            return Err(Error::MissingOneOf {
                params: vec!["build_image", "build_imagestream"],
            });
        }
        Ok(())
    }
}

/// Parameters for a regular container image build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildUserParams {
    #[serde(flatten)]
    pub common: CommonParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Explicit Build/BuildConfig name; derived from the repository when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub koji_parent_build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub koji_upload_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem_koji_task_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_after_koji_task: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_imagestreamtag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub yum_repourls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compose_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_manifests_extract_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_images_digests: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub flatpak: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub isolated: bool,
    /// Worker completion deadline in hours; zero disables it
    #[serde(default, skip_serializing_if = "is_zero")]
    pub worker_deadline: i64,
    /// Orchestrator completion deadline in hours; zero disables it
    #[serde(default, skip_serializing_if = "is_zero")]
    pub orchestrator_deadline: i64,
}

impl BuildUserParams {
    /// Build/BuildConfig name: the explicit `name`, or
    /// `<repo>-<branch>` derived from the git source.
    pub fn name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_owned();
        }
        let repo = git_repo_humanish_part(self.git_uri.as_deref().unwrap_or_default());
        sanitize_name(repo, self.git_branch.as_deref().unwrap_or_default())
    }
}

impl UserParams for BuildUserParams {
    fn validate(&self) -> Result<()> {
        self.common.validate()?;
        require("git_uri", self.git_uri.as_deref())?;
        if let Some(name) = self.name.as_deref() {
            validate_object_name(name)?;
        }
        Ok(())
    }

    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Parameters for a source container build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceContainerUserParams {
    #[serde(flatten)]
    pub common: CommonParams,
    /// NVR of the koji build whose sources are packaged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_for_koji_build_nvr: Option<String>,
    /// ID of the koji build whose sources are packaged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_for_koji_build_id: Option<u64>,
}

impl UserParams for SourceContainerUserParams {
    fn validate(&self) -> Result<()> {
        self.common.validate()?;
        if is_blank(self.sources_for_koji_build_nvr.as_deref())
            && self.sources_for_koji_build_id.is_none()
        {
            return Err(Error::MissingOneOf {
                params: vec!["sources_for_koji_build_nvr", "sources_for_koji_build_id"],
            });
        }
        Ok(())
    }

    fn common(&self) -> &CommonParams {
        &self.common
    }

    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Checks that `name` is a valid OpenShift object name (DNS-1123 subdomain,
/// capped at [`LABEL_MAX_CHARS`]).
pub fn validate_object_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidParam {
        param: "name",
        reason: format!("{name:?} {reason}"),
    };

    if name.is_empty() {
        return Err(invalid("is empty"));
    }
    if name.len() > LABEL_MAX_CHARS {
        return Err(invalid("is longer than 63 characters"));
    }
    if !OBJECT_NAME.is_match(name) {
        return Err(invalid(
            "must consist of lowercase alphanumerics, '-' or '.', and start and end with an alphanumeric character",
        ));
    }
    Ok(())
}

fn require(param: &'static str, value: Option<&str>) -> Result<()> {
    if is_blank(value) {
        Err(Error::MissingParam { param })
    } else {
        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}
