use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;

use crate::config::wiring::PluginUse;
use crate::kernel::{Error, Manager, ManagerState};
use crate::plugin_system::traits::Role;
use crate::tests::common::{label, Harness};
use crate::WiringConfig;

fn polled_and_triggered() -> WiringConfig {
    WiringConfig::new()
        .with_connection(
            PluginUse::new("constant", label("src")),
            vec![PluginUse::new("recorder", label("out"))],
            "1s",
        )
        .with_trigger(
            PluginUse::new("once-watcher", label("w")),
            vec![PluginUse::new("recorder", label("act"))],
        )
}

#[tokio::test(start_paused = true)]
async fn test_stop_closes_in_order() {
    let harness = Harness::new();
    let mut manager = Manager::new(harness.registry(), &polled_and_triggered())
        .await
        .unwrap();
    assert_eq!(manager.state(), ManagerState::Running);
    sleep(Duration::from_millis(10)).await;
    assert!(harness.events().is_empty(), "nothing is closed while running");

    manager.stop().await.unwrap();
    assert_eq!(manager.state(), ManagerState::Closed);
    assert_eq!(
        harness.events(),
        vec![
            "read_close:src",
            "write_close:out",
            "watch_close:w",
            "write_close:act",
            "close:constant",
            "close:recorder",
            "close:once-watcher",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let harness = Harness::new();
    let mut manager = Manager::new(harness.registry(), &polled_and_triggered())
        .await
        .unwrap();

    manager.stop().await.unwrap();
    let after_first = harness.events();
    let writes_after_first = harness.writes().len();

    manager.stop().await.expect("second stop should be a no-op");
    sleep(Duration::from_secs(3)).await;

    assert_eq!(manager.state(), ManagerState::Closed);
    assert_eq!(harness.events(), after_first);
    assert_eq!(harness.writes().len(), writes_after_first);
}

#[tokio::test(start_paused = true)]
async fn test_failed_initialization_releases_everything_bound() {
    let harness = Harness::new();
    let config = WiringConfig::new()
        .with_connection(
            PluginUse::new("constant", label("in0")),
            vec![PluginUse::new("recorder", label("ok"))],
            "1s",
        )
        .with_connection(
            PluginUse::new("constant", label("in1")),
            vec![
                PluginUse::new("recorder", label("kept")),
                PluginUse::new("recorder", json!({ "reject": true })),
            ],
            "1s",
        );

    let err = Manager::new(harness.registry(), &config)
        .await
        .expect_err("rejected parameters should abort construction");
    match &err {
        Error::Initialization { plugin, role, entry, .. } => {
            assert_eq!(plugin, "recorder");
            assert_eq!(*role, Role::Sink);
            assert_eq!(entry, "connections[1].outputs[1]");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.entry(), Some("connections[1].outputs[1]"));

    assert_eq!(
        harness.events(),
        vec![
            "read_close:in1",
            "write_close:kept",
            "read_close:in0",
            "write_close:ok",
            "close:constant",
            "close:recorder",
        ]
    );

    // No scheduler was left behind
    sleep(Duration::from_secs(3)).await;
    assert!(harness.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_trigger_only_manager_runs() {
    let harness = Harness::new();
    let config = WiringConfig::new().with_trigger(
        PluginUse::bare("once-watcher"),
        vec![PluginUse::bare("recorder")],
    );

    let mut manager = Manager::new(harness.registry(), &config).await.unwrap();
    sleep(Duration::from_millis(10)).await;
    manager.stop().await.unwrap();

    assert_eq!(harness.writes(), vec![("recorder".to_string(), 7.0)]);
}

#[tokio::test(start_paused = true)]
async fn test_connection_without_outputs_still_reads() {
    let harness = Harness::new();
    let config =
        WiringConfig::new().with_connection(PluginUse::bare("failing-source"), vec![], "1s");

    let mut manager = Manager::new(harness.registry(), &config).await.unwrap();
    sleep(Duration::from_millis(1500)).await;
    manager.stop().await.unwrap();

    assert_eq!(
        harness
            .read_failures
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );
}
