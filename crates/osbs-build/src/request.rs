//! Build request rendering.
//!
//! A [`BuildRequest`] owns one template document and turns it into a
//! Build/BuildConfig object in a fixed sequence of steps:
//!
//! ```text
//! render(validate)
//!   1. API handle present?        ── else ApiNotSpecified
//!   2. validate user params        ── optional
//!   3. name / output / buildroot   ── metadata.name, spec.output.to, customStrategy.from
//!   4. resource limits, scratch    ── spec.resources.limits, triggers, scratch label
//!   5. env                         ── REACTOR_CONFIG, USER_PARAMS, drop ATOMIC_REACTOR_PLUGINS
//!   6. reactor config data         ── source registry, organization, secrets, flatpak
//!   7. image builds only           ── git source, IST trigger, labels, base image and
//!                                     repo triggers, variation, node selector, deadline
//! ```
//!
//! Source container builds stop after step 6.

use osbs_cloud::OpenShiftApi;
use osbs_core::{
    BuildDefaults, BuildType, BuildUserParams, CommonParams, OsbsConfig, SourceContainerUserParams,
    TemplateConfig, UserParams, git_repo_humanish_part, sanitize_label_value,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::document::{ATOMIC_REACTOR_PLUGINS, BuildDocument, EnvVar};
use crate::error::RenderError;
use crate::reactor::{ReactorConfig, SourceRegistry, fetch_reactor_config, reactor_config_env};
use crate::repo_info::{LabelType, RepoInfo};
use crate::selector::NodeSelectors;
use crate::template::TemplateStore;
use crate::variation::{Variation, check_isolated_release, source_build_name, variation_name};

/// Env entry carrying the serialized user parameters.
pub const USER_PARAMS_ENV: &str = "USER_PARAMS";

/// Parameters of a regular image build request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImageBuildParams {
    #[serde(flatten)]
    pub user: BuildUserParams,
    /// The build was started by an image change trigger
    #[serde(default)]
    pub is_auto: bool,
    #[serde(default)]
    pub node_selectors: NodeSelectors,
}

/// What kind of build is requested, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    Image(ImageBuildParams),
    Source(SourceContainerUserParams),
}

impl RequestParams {
    pub fn common(&self) -> &CommonParams {
        self.user_params().common()
    }

    fn user_params(&self) -> &dyn UserParams {
        match self {
            Self::Image(image) => &image.user,
            Self::Source(source) => source,
        }
    }

    fn variation(&self) -> Result<Variation, RenderError> {
        match self {
            Self::Image(image) => {
                Variation::resolve(image.user.common.scratch, image.is_auto, image.user.isolated)
            }
            Self::Source(source) => Variation::resolve(source.common.scratch, false, false),
        }
    }
}

impl From<ImageBuildParams> for RequestParams {
    fn from(params: ImageBuildParams) -> Self {
        Self::Image(params)
    }
}

impl From<SourceContainerUserParams> for RequestParams {
    fn from(params: SourceContainerUserParams) -> Self {
        Self::Source(params)
    }
}

/// Resource limits for the build pod; unset values keep the template's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub storage: Option<String>,
}

impl ResourceLimits {
    fn merge(&mut self, other: Self) {
        self.cpu = other.cpu.or(self.cpu.take());
        self.memory = other.memory.or(self.memory.take());
        self.storage = other.storage.or(self.storage.take());
    }

    fn entries(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        [
            ("cpu", &self.cpu),
            ("memory", &self.memory),
            ("storage", &self.storage),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| (key.to_owned(), Value::String(v.clone())))
        })
    }
}

/// Renders one Build/BuildConfig request from a template and parameters.
pub struct BuildRequest<'a> {
    store: TemplateStore,
    templates: TemplateConfig,
    outer_template: Option<String>,
    template: Option<BuildDocument>,
    params: RequestParams,
    variation: Variation,
    api: Option<&'a dyn OpenShiftApi>,
    resource_limits: Option<ResourceLimits>,
    repo_info: Option<RepoInfo>,
    secrets_path: String,
    reactor_config_key: String,
    isolated_release_format: Regex,
    source_registry: Option<SourceRegistry>,
    organization: Option<String>,
}

impl<'a> BuildRequest<'a> {
    /// Create a request reading templates from `store`, with default
    /// settings. Fails if the parameters request conflicting variations.
    pub fn new(store: TemplateStore, params: impl Into<RequestParams>) -> Result<Self, RenderError> {
        let templates = TemplateConfig {
            build_json_dir: store.root().to_path_buf(),
            ..TemplateConfig::default()
        };
        Self::build(store, templates, &BuildDefaults::default(), params.into())
    }

    /// Create a request with template locations and build settings from
    /// `config`.
    pub fn from_config(
        config: &OsbsConfig,
        params: impl Into<RequestParams>,
    ) -> Result<Self, RenderError> {
        Self::build(
            TemplateStore::from_config(&config.templates),
            config.templates.clone(),
            &config.build,
            params.into(),
        )
    }

    fn build(
        store: TemplateStore,
        templates: TemplateConfig,
        defaults: &BuildDefaults,
        params: RequestParams,
    ) -> Result<Self, RenderError> {
        let pattern = &defaults.isolated_release_format;
        let isolated_release_format =
            Regex::new(pattern).map_err(|e| RenderError::ReleasePattern {
                pattern: pattern.clone(),
                source: e,
            })?;
        let variation = params.variation()?;

        Ok(Self {
            store,
            templates,
            outer_template: None,
            template: None,
            params,
            variation,
            api: None,
            resource_limits: None,
            repo_info: None,
            secrets_path: defaults.secrets_path.clone(),
            reactor_config_key: defaults.reactor_config_key.clone(),
            isolated_release_format,
            source_registry: None,
            organization: None,
        })
    }

    /// Replace the parameters. Conflicting variations are rejected and leave
    /// the request unchanged.
    pub fn set_params(&mut self, params: impl Into<RequestParams>) -> Result<(), RenderError> {
        let params = params.into();
        self.variation = params.variation()?;
        tracing::debug!(?params, "setting build request params");
        self.params = params;
        Ok(())
    }

    pub fn with_api(mut self, api: &'a dyn OpenShiftApi) -> Self {
        self.api = Some(api);
        self
    }

    pub fn set_api(&mut self, api: &'a dyn OpenShiftApi) {
        self.api = Some(api);
    }

    /// Use `name` instead of the default outer template for this kind of build.
    pub fn with_outer_template(mut self, name: impl Into<String>) -> Self {
        self.outer_template = Some(name.into());
        self
    }

    pub fn with_resource_limits(mut self, limits: ResourceLimits) -> Self {
        self.set_resource_limits(limits);
        self
    }

    /// Merge `limits` into the limits set so far.
    pub fn set_resource_limits(&mut self, limits: ResourceLimits) {
        self.resource_limits
            .get_or_insert_with(ResourceLimits::default)
            .merge(limits);
    }

    pub fn with_repo_info(mut self, repo_info: RepoInfo) -> Self {
        self.repo_info = Some(repo_info);
        self
    }

    pub fn set_repo_info(&mut self, repo_info: RepoInfo) {
        self.repo_info = Some(repo_info);
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    pub fn variation(&self) -> Variation {
        self.variation
    }

    /// Source registry from the reactor config, known after rendering.
    pub fn source_registry(&self) -> Option<&SourceRegistry> {
        self.source_registry.as_ref()
    }

    /// Registry organization from the reactor config, known after rendering.
    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }

    /// The document as rendered (or loaded) so far.
    pub fn document(&self) -> Option<&BuildDocument> {
        self.template.as_ref()
    }

    pub fn into_document(self) -> Option<BuildDocument> {
        self.template
    }

    /// Name of the rendered Build/BuildConfig.
    pub fn build_id(&self) -> Option<&str> {
        self.template.as_ref().map(BuildDocument::name)
    }

    fn outer_template(&self) -> &str {
        match (&self.outer_template, &self.params) {
            (Some(name), _) => name,
            (None, RequestParams::Image(_)) => &self.templates.outer_template,
            (None, RequestParams::Source(_)) => &self.templates.sources_outer_template,
        }
    }

    /// Load the template unless it already is.
    pub fn ensure_loaded(&mut self) -> Result<&mut BuildDocument, RenderError> {
        let doc = self.take_loaded()?;
        Ok(self.template.insert(doc))
    }

    fn take_loaded(&mut self) -> Result<BuildDocument, RenderError> {
        match self.template.take() {
            Some(doc) => Ok(doc),
            None => Ok(self.store.load(self.outer_template())?),
        }
    }

    /// Render the request. With `validate` unset the user parameters are
    /// trusted as given.
    ///
    /// On error the document may be partially rendered and must be discarded.
    pub fn render(&mut self, validate: bool) -> Result<&BuildDocument, RenderError> {
        let api = self.api.ok_or(RenderError::ApiNotSpecified)?;
        if validate {
            self.params.user_params().validate()?;
        }

        let mut doc = self.take_loaded()?;
        let result = self.render_document(&mut doc, api);
        let doc = self.template.insert(doc);
        result?;

        tracing::debug!(name = %doc.name(), document = ?doc, "rendered build request");
        Ok(&*doc)
    }

    fn render_document(
        &mut self,
        doc: &mut BuildDocument,
        api: &dyn OpenShiftApi,
    ) -> Result<(), RenderError> {
        self.render_name(doc)?;
        self.render_output_name(doc);
        self.render_custom_strategy(doc);
        self.render_resource_limits(doc);
        self.adjust_for_scratch(doc);
        self.set_reactor_config(doc)?;
        self.render_user_params(doc)?;
        doc.remove_env(ATOMIC_REACTOR_PLUGINS);

        let reactor =
            fetch_reactor_config(self.params.common(), api, &self.reactor_config_key)?;
        self.set_data_from_reactor_config(doc, &reactor)?;

        if let RequestParams::Image(image) = &self.params {
            self.render_image_build(doc, image)?;
        }
        Ok(())
    }

    // ── Shared steps ──

    fn render_name(&self, doc: &mut BuildDocument) -> Result<(), RenderError> {
        let common = self.params.common();
        let image_tag = common.image_tag.as_deref().unwrap_or_default();

        let name = match &self.params {
            RequestParams::Image(image) => {
                variation_name(self.variation, image_tag, common.platform.as_deref())?
                    .unwrap_or_else(|| image.user.name())
            }
            RequestParams::Source(_) => source_build_name(image_tag, self.variation.is_scratch())?,
        };
        doc.metadata.name = name;
        Ok(())
    }

    fn render_output_name(&self, doc: &mut BuildDocument) {
        if let Some(tag) = &self.params.common().image_tag {
            doc.spec.output.to.name = tag.clone();
        }
    }

    fn render_custom_strategy(&self, doc: &mut BuildDocument) {
        let common = self.params.common();
        let from = &mut doc.custom_strategy_mut().from;

        if let Some(stream) = common.build_imagestream.as_deref().filter(|s| !s.is_empty()) {
            from.kind = Some("ImageStreamTag".to_owned());
            from.name = stream.to_owned();
        } else if let Some(image) = &common.build_image {
            from.name = image.clone();
        }
    }

    fn render_resource_limits(&self, doc: &mut BuildDocument) {
        if let Some(limits) = &self.resource_limits {
            doc.merge_resource_limits(limits.entries());
        }
    }

    /// Scratch builds must not affect subsequent builds and are not imported
    /// into Koji.
    fn adjust_for_scratch(&self, doc: &mut BuildDocument) {
        if self.variation.is_scratch() {
            doc.remove_triggers();
            set_label(doc, "scratch", "true");
        }
    }

    fn set_reactor_config(&self, doc: &mut BuildDocument) -> Result<(), RenderError> {
        if let Some(env) = reactor_config_env(self.params.common(), &self.reactor_config_key)? {
            doc.push_env(env);
        }
        Ok(())
    }

    fn render_user_params(&self, doc: &mut BuildDocument) -> Result<(), RenderError> {
        let json = self
            .params
            .user_params()
            .to_json()
            .map_err(|e| RenderError::Serialize {
                what: "user params",
                source: e,
            })?;
        doc.push_env(EnvVar::value(USER_PARAMS_ENV, json));
        Ok(())
    }

    fn set_data_from_reactor_config(
        &mut self,
        doc: &mut BuildDocument,
        reactor: &ReactorConfig,
    ) -> Result<(), RenderError> {
        if let Some(registry) = &reactor.source_registry {
            self.source_registry = Some(registry.clone());
        }
        if let Some(organization) = &reactor.registries_organization {
            self.organization = Some(organization.clone());
        }

        let with_worker_tokens = match &self.params {
            RequestParams::Image(image) => image.user.common.build_type == BuildType::Orchestrator,
            RequestParams::Source(_) => false,
        };
        doc.add_secrets(reactor.secrets(with_worker_tokens), &self.secrets_path);

        if let RequestParams::Image(image) = &mut self.params {
            if image.user.flatpak {
                let base_image = reactor
                    .flatpak_base_image()
                    .ok_or(RenderError::MissingFlatpakBaseImage)?;
                image.user.base_image = Some(base_image.to_owned());
            }
        }
        Ok(())
    }

    // ── Image build steps ──

    fn render_image_build(
        &self,
        doc: &mut BuildDocument,
        image: &ImageBuildParams,
    ) -> Result<(), RenderError> {
        let user = &image.user;

        doc.set_git_source(user.git_uri.clone(), user.git_ref.clone());

        if let Some(tag) = &user.trigger_imagestreamtag {
            if doc.has_ist_trigger() {
                doc.set_ist_trigger_tag(tag);
            }
        }

        self.render_labels(doc, user);
        self.adjust_triggers_for_base_image(doc, user.base_image.as_deref());
        self.adjust_for_repo_info(doc)?;
        self.adjust_for_variation(doc, user)?;
        self.render_node_selectors(doc, image);
        self.render_deadline(doc, user);
        Ok(())
    }

    fn render_labels(&self, doc: &mut BuildDocument, user: &BuildUserParams) {
        let git_uri = user.git_uri.as_deref().unwrap_or_default();

        // The repo name tells repos apart; the full URL is there as an
        // optional filter.
        set_label(doc, "git-repo-name", git_repo_humanish_part(git_uri));
        set_label(
            doc,
            "git-branch",
            user.git_branch.as_deref().unwrap_or_default(),
        );
        set_label(doc, "git-full-repo", git_uri);

        if let Some(task_id) = user.common.koji_task_id {
            let task_id = task_id.to_string();
            set_label(doc, "koji-task-id", &task_id);

            // Manual builds keep their task even once autorebuilds delegate
            // to a new one.
            if user.triggered_after_koji_task.is_none() {
                set_label(doc, "original-koji-task-id", &task_id);
            }
        }
    }

    fn adjust_triggers_for_base_image(&self, doc: &mut BuildDocument, base_image: Option<&str>) {
        if !doc.has_triggers() {
            return;
        }
        if is_custom_base_image(base_image) {
            tracing::info!("removing triggers from request because custom base image");
            doc.remove_triggers();
        } else if is_from_scratch_image(base_image) {
            tracing::info!("removing triggers from request because FROM scratch image");
            doc.remove_triggers();
        }
    }

    fn adjust_for_repo_info(&self, doc: &mut BuildDocument) -> Result<(), RenderError> {
        let Some(repo_info) = &self.repo_info else {
            tracing::warn!("repo info not set");
            return Ok(());
        };

        if !repo_info.is_autorebuild_enabled() {
            tracing::info!("autorebuild is disabled in repo configuration, removing triggers");
            doc.remove_triggers();
            return Ok(());
        }

        if repo_info.add_timestamp_to_release() {
            tracing::info!(
                "add_timestamp_to_release is enabled for autorebuilds, skipping release check in dockerfile"
            );
            return Ok(());
        }

        match repo_info.labels().get_name_and_value(LabelType::Release) {
            Some(_) => Err(RenderError::ReleaseLabelWithAutorebuild),
            None => Ok(()),
        }
    }

    fn adjust_for_variation(
        &self,
        doc: &mut BuildDocument,
        user: &BuildUserParams,
    ) -> Result<(), RenderError> {
        if self.variation.removes_triggers() && doc.remove_triggers() {
            tracing::info!(variation = ?self.variation, "removing triggers from request");
        }

        if self.variation.is_isolated() {
            let release =
                check_isolated_release(user.release.as_deref(), &self.isolated_release_format)?;
            set_label(doc, "isolated", "true");
            set_label(doc, "isolated-release", release);
        }
        Ok(())
    }

    /// Orchestrator builds are scheduled elsewhere; only workers get a
    /// node selector.
    fn render_node_selectors(&self, doc: &mut BuildDocument, image: &ImageBuildParams) {
        if image.user.common.build_type == BuildType::Worker {
            doc.spec.node_selector = Some(image.node_selectors.resolve(self.variation));
        }
    }

    fn render_deadline(&self, doc: &mut BuildDocument, user: &BuildUserParams) {
        let hours = match user.common.build_type {
            BuildType::Worker => user.worker_deadline,
            BuildType::Orchestrator => user.orchestrator_deadline,
        };
        doc.set_deadline_hours(hours);
    }
}

fn set_label(doc: &mut BuildDocument, name: &str, value: &str) {
    doc.set_label(name, sanitize_label_value(value));
}

/// Whether `base_image` is a custom base image built by koji
/// (`koji/image-build[:tag]`).
pub fn is_custom_base_image(base_image: Option<&str>) -> bool {
    base_image.is_some_and(|image| {
        image == "koji/image-build" || image.starts_with("koji/image-build:")
    })
}

/// Whether the build is `FROM scratch`.
pub fn is_from_scratch_image(base_image: Option<&str>) -> bool {
    base_image == Some("scratch")
}
