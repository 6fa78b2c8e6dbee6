use std::fmt;

use osbs_cloud::ApiError;

use crate::template::TemplateError;

/// Broad class of a render failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or unreadable configuration, including the template file.
    Config,
    /// The template is not a parseable build object.
    Format,
    /// Bad, missing, or conflicting request parameters.
    Validation,
    /// Repository content contradicts the requested build.
    Consistency,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Config => "configuration error",
            Self::Format => "format error",
            Self::Validation => "validation error",
            Self::Consistency => "consistency error",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Params(#[from] osbs_core::Error),

    #[error("invalid isolated release format {pattern:?}")]
    ReleasePattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("OpenShift API is not specified")]
    ApiNotSpecified,

    #[error("build variations are mutually exclusive: set scratch, is_auto, isolated, or none")]
    ConflictingVariations,

    #[error("image tag {tag:?} does not end with -<salt>-<timestamp>")]
    MalformedImageTag { tag: String },

    #[error("the release parameter is required for isolated builds")]
    MissingIsolatedRelease,

    #[error("for isolated builds, the release value must be in the format: {pattern}")]
    InvalidIsolatedRelease { release: String, pattern: String },

    #[error("flatpak_base_image must be provided")]
    MissingFlatpakBaseImage,

    #[error("failed to fetch reactor config map {name}")]
    ReactorConfigMap { name: String, source: ApiError },

    #[error("reactor config has an unexpected shape")]
    ReactorConfigShape { source: serde_json::Error },

    #[error("failed to serialize {what}")]
    Serialize {
        what: &'static str,
        source: serde_json::Error,
    },

    #[error("failed to serialize reactor config override as YAML")]
    SerializeYaml { source: serde_yaml::Error },

    #[error(
        "when autorebuild is enabled in repo configuration, \"release\" label must not be set in Dockerfile"
    )]
    ReleaseLabelWithAutorebuild,
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Template(TemplateError::Open { .. }) => ErrorKind::Config,
            Self::Template(TemplateError::Parse { .. }) => ErrorKind::Format,
            Self::Params(osbs_core::Error::ConfigLoad { .. } | osbs_core::Error::ConfigParse { .. })
            | Self::ReleasePattern { .. } => ErrorKind::Config,
            Self::ReleaseLabelWithAutorebuild => ErrorKind::Consistency,
            Self::Params(_)
            | Self::ApiNotSpecified
            | Self::ConflictingVariations
            | Self::MalformedImageTag { .. }
            | Self::MissingIsolatedRelease
            | Self::InvalidIsolatedRelease { .. }
            | Self::MissingFlatpakBaseImage
            | Self::ReactorConfigMap { .. }
            | Self::ReactorConfigShape { .. }
            | Self::Serialize { .. }
            | Self::SerializeYaml { .. } => ErrorKind::Validation,
        }
    }
}
