//! Orchestrator build and lifecycle tests.
//!
//! Credentials are disabled so no Google metadata server is contacted.

use std::io::Write;

use promdriver_core::config::PromdriverConfig;
use promdriver_daemon::orchestrator::Orchestrator;

const CONFIG: &str = r#"
[sink]
endpoint = "http://127.0.0.1:1"
credentials = "none"

[[targets]]
target = "http://127.0.0.1:1/metrics"
interval = "1h"
resource = { type = "global", labels = { project_id = "p" } }

[[targets]]
target = "http://127.0.0.1:2/metrics"
interval = "1h"
resource = { type = "global", labels = { project_id = "p" } }
metric = { prefix = ["two"], filter = "^up$" }
"#;

#[tokio::test]
async fn test_build_from_config_resolves_targets() {
    // Given: a valid configuration with two targets
    let config = PromdriverConfig::parse(CONFIG).expect("parse");

    // When: building the orchestrator
    let orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build should succeed");

    // Then: both targets are resolved, nothing is running yet
    assert_eq!(orchestrator.targets().len(), 2);
    assert_eq!(orchestrator.targets()[1].name_prefix, vec!["two".to_owned()]);
    assert_eq!(orchestrator.running_targets(), 0);
    assert_eq!(orchestrator.config().sink.batch_size, 200);
}

#[tokio::test]
async fn test_start_and_shutdown() {
    // Given: a built orchestrator
    let config = PromdriverConfig::parse(CONFIG).expect("parse");
    let mut orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build");

    // When: starting, then shutting down
    orchestrator.start();
    assert_eq!(orchestrator.running_targets(), 2);
    let report = orchestrator.shutdown().await;

    // Then: every loop stopped cleanly
    assert_eq!(report.stopped, 2);
    assert_eq!(report.aborted, 0);
    assert_eq!(orchestrator.running_targets(), 0);
}

#[tokio::test]
async fn test_start_twice_does_not_duplicate_loops() {
    let config = PromdriverConfig::parse(CONFIG).expect("parse");
    let mut orchestrator = Orchestrator::build_from_config(config)
        .await
        .expect("build");

    orchestrator.start();
    orchestrator.start();

    assert_eq!(orchestrator.running_targets(), 2);
    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    // Given: a target whose filter is not a valid regex
    let config = PromdriverConfig::parse(
        r#"
[sink]
credentials = "none"

[[targets]]
target = "http://127.0.0.1:1/metrics"
interval = "15s"
resource = { type = "global", labels = { project_id = "p" } }
metric = { filter = "(" }
"#,
    )
    .expect("parse");

    // When: building
    let result = Orchestrator::build_from_config(config).await;

    // Then: the build fails before anything starts
    let err = result.err().expect("build should fail");
    assert!(
        err.to_string().contains("targets[0].metric.filter"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_build_from_path() {
    // Given: the configuration written to disk
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tempfile");
    file.write_all(CONFIG.as_bytes()).expect("write");

    // When: building from the path
    let orchestrator = Orchestrator::build(file.path()).await.expect("build");

    // Then
    assert_eq!(orchestrator.targets().len(), 2);
}

#[tokio::test]
async fn test_build_fails_for_missing_file() {
    let result = Orchestrator::build(std::path::Path::new("/nonexistent/promdriver.toml")).await;

    let err = result.err().expect("build should fail");
    assert!(err.to_string().contains("failed to load config"));
}
