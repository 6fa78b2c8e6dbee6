//! Core types and configuration for OpenShift build requests.
//!
//! This crate defines the `osbs.toml` schema ([`OsbsConfig`]), the user
//! parameter sets a build request is rendered from ([`BuildUserParams`],
//! [`SourceContainerUserParams`]), label sanitization helpers, and the shared
//! error type.

pub mod config;
pub mod error;
pub mod labels;
pub mod params;

pub use config::{BuildDefaults, ClusterConfig, OsbsConfig, TemplateConfig};
pub use error::{Error, Result};
pub use labels::{git_repo_humanish_part, sanitize_label_value, sanitize_name};
pub use params::{BuildType, BuildUserParams, CommonParams, SourceContainerUserParams, UserParams};

/// Directory under which build secrets are mounted.
pub const SECRETS_PATH: &str = "/var/run/secrets/atomic-reactor";

/// Default outer template for image builds.
pub const DEFAULT_OUTER_TEMPLATE: &str = "orchestrator.json";

/// Default outer template for source container builds.
pub const DEFAULT_SOURCES_OUTER_TEMPLATE: &str = "orchestrator_sources.json";

/// Release format required for isolated builds, e.g. `1.1` or `2.3.el8`.
pub const ISOLATED_RELEASE_FORMAT: &str = r"^\d+\.\d+(\..+)?$";

/// Key of the reactor configuration inside its config map.
pub const REACTOR_CONFIG_KEY: &str = "config.yaml";
