//! Rendering of OpenShift Build/BuildConfig requests.
//!
//! # Render pipeline
//!
//! ```text
//! TemplateStore::load ── outer template JSON → BuildDocument
//! BuildRequest::render
//!   ├─ name, output, buildroot, resource limits
//!   ├─ variation (scratch / auto / isolated) adjustments
//!   ├─ REACTOR_CONFIG + USER_PARAMS env, secrets from reactor config
//!   └─ image builds: git source, labels, triggers, node selector, deadline
//! ```
//!
//! # Request kinds
//!
//! - [`RequestParams::Image`]: a regular image build, rendered into a
//!   BuildConfig named after the repository and branch.
//! - [`RequestParams::Source`]: a source container build, rendered into a
//!   uniquely named Build.

pub mod document;
pub mod error;
pub mod reactor;
pub mod repo_info;
pub mod request;
pub mod selector;
pub mod template;
pub mod variation;

pub use document::BuildDocument;
pub use error::{ErrorKind, RenderError};
pub use reactor::ReactorConfig;
pub use repo_info::{AutorebuildConfig, DockerfileLabels, LabelType, RepoInfo};
pub use request::{BuildRequest, ImageBuildParams, RequestParams, ResourceLimits};
pub use selector::{NodeSelector, NodeSelectors};
pub use template::{TemplateError, TemplateStore};
pub use variation::Variation;
