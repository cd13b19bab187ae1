use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::plugin_system::{Capabilities, Parameters, Plugin, PluginError, PluginInstances, Role};
use crate::tests::common::Harness;

#[derive(Debug, Deserialize, PartialEq)]
struct ProbeParams {
    #[serde(default)]
    label: Option<String>,
    #[serde(default = "default_scale")]
    scale: f64,
}

fn default_scale() -> f64 {
    1.0
}

#[test]
fn test_missing_parameters_decode_as_empty_map() {
    let params = Parameters::default();
    assert!(params.is_empty());
    let decoded: ProbeParams = params.decode().unwrap();
    assert_eq!(
        decoded,
        ProbeParams {
            label: None,
            scale: 1.0
        }
    );
}

#[test]
fn test_parameters_decode_fields() {
    let params = Parameters::new(json!({ "label": "Attic", "scale": 0.5 }));
    assert!(!params.is_empty());
    let decoded: ProbeParams = params.decode().unwrap();
    assert_eq!(decoded.label.as_deref(), Some("Attic"));
    assert_eq!(decoded.scale, 0.5);
}

#[test]
fn test_parameters_type_mismatch_is_invalid_parameters() {
    let params = Parameters::new(json!({ "scale": "loud" }));
    let err = params.decode::<ProbeParams>().unwrap_err();
    assert!(matches!(err, PluginError::InvalidParameters { .. }));
    assert!(err.to_string().starts_with("Invalid parameters"));
}

#[test]
fn test_parameters_are_transparent_in_documents() {
    let params: Parameters = serde_json::from_str(r#"{"device": "28-0000"}"#).unwrap();
    assert_eq!(params.as_value(), &json!({ "device": "28-0000" }));
    assert!(Parameters::empty().is_empty());
    assert!(!Parameters::new(json!(3)).is_empty());
}

#[test]
fn test_role_display() {
    assert_eq!(Role::Source.to_string(), "source");
    assert_eq!(Role::Sink.to_string(), "sink");
    assert_eq!(Role::Watcher.to_string(), "watcher");
}

#[test]
fn test_cancelled_is_not_a_failure_kind() {
    assert!(PluginError::Cancelled.is_cancelled());
    assert!(!PluginError::operation("boom").is_cancelled());
    let io: PluginError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, PluginError::Io(_)));
}

#[test]
fn test_empty_capabilities() {
    let caps = Capabilities::new();
    assert!(caps.roles().is_empty());
    assert!(!caps.has(Role::Sink));
    assert!(caps.source().is_none());
}

#[tokio::test]
async fn test_capabilities_reflect_implemented_roles() {
    let harness = Harness::new();
    let mut instances = PluginInstances::new(harness.registry());

    let watcher = instances.resolve("once-watcher", None, "test").await.unwrap();
    let caps = Arc::clone(watcher.plugin()).capabilities();
    assert_eq!(caps.roles(), vec![Role::Watcher]);
    assert!(caps.watcher().is_some());
    assert!(format!("{caps:?}").contains("Watcher"));

    let sink = instances.resolve("recorder", None, "test").await.unwrap();
    assert!(sink.capabilities().has(Role::Sink));
    assert!(!sink.capabilities().has(Role::Source));
}
