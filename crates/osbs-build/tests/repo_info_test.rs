use osbs_build::{AutorebuildConfig, DockerfileLabels, LabelType, RepoInfo};

#[test]
fn dockerfile_label_lookup_accepts_legacy_names() {
    let labels: DockerfileLabels = [("BZComponent", "foo"), ("version", "1.0")].into_iter().collect();

    assert_eq!(
        labels.get_name_and_value(LabelType::Component),
        Some(("BZComponent", "foo"))
    );
    assert_eq!(labels.get_name_and_value(LabelType::Version), Some(("version", "1.0")));
    assert_eq!(labels.get_name_and_value(LabelType::Release), None);
}

#[test]
fn dockerfile_label_lookup_prefers_current_name() {
    let labels: DockerfileLabels = [("Name", "old"), ("name", "new")].into_iter().collect();

    assert_eq!(labels.get_name_and_value(LabelType::Name), Some(("name", "new")));
}

#[test]
fn autorebuild_config_from_container_yaml() {
    let config: AutorebuildConfig =
        serde_yaml::from_str("enabled: true\nadd_timestamp_to_release: true\n").unwrap();
    let repo_info = RepoInfo::new(config, DockerfileLabels::default());

    assert!(repo_info.is_autorebuild_enabled());
    assert!(repo_info.add_timestamp_to_release());
    assert_eq!(repo_info.labels().get_name_and_value(LabelType::Name), None);
}

#[test]
fn autorebuild_is_disabled_by_default() {
    let config: AutorebuildConfig = serde_yaml::from_str("{}").unwrap();

    assert!(!RepoInfo::new(config, DockerfileLabels::default()).is_autorebuild_enabled());
}
