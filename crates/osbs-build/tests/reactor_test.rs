use osbs_build::RenderError;
use osbs_build::reactor::{REACTOR_CONFIG_ENV, ReactorConfig, reactor_config_env};
use osbs_core::CommonParams;
use serde_json::{Value, json};

#[test]
fn reactor_config_env_absent_without_config() {
    assert!(reactor_config_env(&CommonParams::default(), "config.yaml").unwrap().is_none());

    let params = CommonParams {
        reactor_config_map: Some(String::new()),
        ..CommonParams::default()
    };
    assert!(reactor_config_env(&params, "config.yaml").unwrap().is_none());
}

#[test]
fn reactor_config_env_references_config_map_key() {
    let params = CommonParams {
        reactor_config_map: Some("reactor-config-map".to_owned()),
        ..CommonParams::default()
    };

    let env = reactor_config_env(&params, "reactor.yaml").unwrap().unwrap();

    assert_eq!(env.name, REACTOR_CONFIG_ENV);
    let key_ref = env.value_from.and_then(|v| v.config_map_key_ref).unwrap();
    assert_eq!(key_ref.name, "reactor-config-map");
    assert_eq!(key_ref.key, "reactor.yaml");
}

#[test]
fn reactor_config_from_value() {
    let config = ReactorConfig::from_value(json!({
        "version": 1,
        "required_secrets": ["a"],
        "worker_token_secrets": ["b"],
        "flatpak": {"base_image": "flatpak-base:latest"},
        "clusters": {"x86_64": []}
    }))
    .unwrap();

    assert_eq!(config.secrets(true).collect::<Vec<_>>(), ["a", "b"]);
    assert_eq!(config.secrets(false).collect::<Vec<_>>(), ["a"]);
    assert_eq!(config.flatpak_base_image(), Some("flatpak-base:latest"));
    assert!(config.extra.contains_key("clusters"));
}

#[test]
fn null_reactor_config_is_empty() {
    let config = ReactorConfig::from_value(Value::Null).unwrap();

    assert_eq!(config, ReactorConfig::default());
    assert_eq!(config.secrets(true).count(), 0);
    assert_eq!(config.flatpak_base_image(), None);
}

#[test]
fn secret_lists_without_value_are_empty() {
    let data: Value = serde_yaml::from_str("required_secrets:\nworker_token_secrets:\n").unwrap();

    let config = ReactorConfig::from_value(data).unwrap();

    assert!(config.required_secrets.is_empty());
    assert!(config.worker_token_secrets.is_empty());
}

#[test]
fn secret_list_of_wrong_type_is_rejected() {
    assert!(matches!(
        ReactorConfig::from_value(json!({"required_secrets": "a"})),
        Err(RenderError::ReactorConfigShape { .. })
    ));
}

#[test]
fn empty_flatpak_base_image_counts_as_missing() {
    let config = ReactorConfig::from_value(json!({"flatpak": {"base_image": ""}})).unwrap();

    assert_eq!(config.flatpak_base_image(), None);
}
