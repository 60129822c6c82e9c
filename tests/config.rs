use std::collections::HashMap;

use tabletest::config::{EPSILON_VAR, RENDER_CAP_VAR};
use tabletest::{Config, HarnessError, DEFAULT_EPSILON, DEFAULT_RENDER_CAP};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.epsilon, DEFAULT_EPSILON);
    assert_eq!(config.render_cap, DEFAULT_RENDER_CAP);
}

#[test]
fn test_overrides() {
    let config =
        Config::from_lookup(lookup(&[(EPSILON_VAR, "1e-9"), (RENDER_CAP_VAR, " 80 ")])).unwrap();
    assert_eq!(config.epsilon, 1e-9);
    assert_eq!(config.render_cap, 80);
}

#[test]
fn test_rejects_bad_values() {
    for (key, raw) in [
        (EPSILON_VAR, "tiny"),
        (EPSILON_VAR, "-1"),
        (EPSILON_VAR, "NaN"),
        (RENDER_CAP_VAR, "0"),
        (RENDER_CAP_VAR, "-3"),
    ] {
        let err = Config::from_lookup(lookup(&[(key, raw)])).unwrap_err();
        assert!(
            matches!(err, HarnessError::Config { key: k, .. } if k == key),
            "{key}={raw}: {err}"
        );
    }
}

#[test]
fn test_builders() {
    let config = Config::default().with_epsilon(0.25).with_render_cap(9);
    assert_eq!(config.epsilon, 0.25);
    assert_eq!(config.render_cap, 9);
}
