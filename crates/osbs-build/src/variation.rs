//! Build variations and the naming rules that depend on them.

use regex::Regex;

use crate::error::RenderError;

/// Mutually exclusive kinds of non-regular builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Variation {
    #[default]
    None,
    /// Disposable build: must not affect later builds or be imported.
    Scratch,
    /// Build started automatically by an image change trigger.
    Auto,
    /// Build patching a specific release without moving floating tags.
    Isolated,
}

impl Variation {
    /// Resolve the variation from the request flags; at most one may be set.
    pub fn resolve(scratch: bool, is_auto: bool, isolated: bool) -> Result<Self, RenderError> {
        match (scratch, is_auto, isolated) {
            (false, false, false) => Ok(Self::None),
            (true, false, false) => Ok(Self::Scratch),
            (false, true, false) => Ok(Self::Auto),
            (false, false, true) => Ok(Self::Isolated),
            _ => Err(RenderError::ConflictingVariations),
        }
    }

    pub fn is_scratch(self) -> bool {
        self == Self::Scratch
    }

    pub fn is_isolated(self) -> bool {
        self == Self::Isolated
    }

    /// Variations never take part in automatic rebuild chains.
    pub fn removes_triggers(self) -> bool {
        self != Self::None
    }

    /// Prefix of the unique object name used instead of the stable one.
    pub fn name_prefix(self) -> Option<&'static str> {
        match self {
            Self::Scratch => Some("scratch"),
            Self::Isolated => Some("isolated"),
            Self::None | Self::Auto => None,
        }
    }
}

/// Check an isolated build's release against `format`.
pub fn check_isolated_release<'a>(
    release: Option<&'a str>,
    format: &Regex,
) -> Result<&'a str, RenderError> {
    let release = release
        .filter(|r| !r.is_empty())
        .ok_or(RenderError::MissingIsolatedRelease)?;

    if !format.is_match(release) {
        return Err(RenderError::InvalidIsolatedRelease {
            release: release.to_owned(),
            pattern: format.as_str().to_owned(),
        });
    }
    Ok(release)
}

/// Split an image tag `<anything>-<salt>-<timestamp>` into salt and timestamp.
pub fn salt_and_timestamp(tag: &str) -> Result<(&str, &str), RenderError> {
    let mut parts = tag.rsplitn(3, '-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(timestamp), Some(salt), Some(_)) => Ok((salt, timestamp)),
        _ => Err(RenderError::MalformedImageTag {
            tag: tag.to_owned(),
        }),
    }
}

/// Strip a trailing `-<platform>` from `tag`. Platform names may contain
/// characters OpenShift does not allow in object names.
pub fn strip_platform_suffix<'a>(tag: &'a str, platform: Option<&str>) -> &'a str {
    platform
        .filter(|p| !p.is_empty())
        .and_then(|p| tag.strip_suffix(p))
        .and_then(|rest| rest.strip_suffix('-'))
        .unwrap_or(tag)
}

/// Unique name for a scratch or isolated image build.
pub fn variation_name(
    variation: Variation,
    image_tag: &str,
    platform: Option<&str>,
) -> Result<Option<String>, RenderError> {
    let Some(prefix) = variation.name_prefix() else {
        return Ok(None);
    };
    let tag = strip_platform_suffix(image_tag, platform);
    let (salt, timestamp) = salt_and_timestamp(tag)?;
    Ok(Some(format!("{prefix}-{salt}-{timestamp}")))
}

/// Name for a source container build; these are plain builds, not build
/// configs, so every invocation gets a unique name.
pub fn source_build_name(image_tag: &str, scratch: bool) -> Result<String, RenderError> {
    let (salt, timestamp) = salt_and_timestamp(image_tag)?;
    let name = format!("sources-{salt}-{timestamp}");
    Ok(if scratch {
        format!("scratch-{name}")
    } else {
        name
    })
}
