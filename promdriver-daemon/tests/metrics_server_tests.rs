//! Integration tests for the self-metrics endpoint.
//!
//! The recorder is process-global, so only one test may install it successfully.

use std::time::Duration;

use promdriver_core::config::MetricsConfig;
use promdriver_daemon::metrics_server;
use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
#[serial]
async fn test_install_metrics_recorder_serves_metrics() {
    // Given: a valid metrics configuration
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_owned(),
        port: 19464,
    };

    // When: installing the recorder and recording a counter
    metrics_server::install_metrics_recorder(&config).expect("install");
    metrics::counter!(
        promdriver_core::metrics::SCRAPES_TOTAL,
        promdriver_core::metrics::LABEL_TARGET => "http://x/metrics",
        promdriver_core::metrics::LABEL_RESULT => promdriver_core::metrics::RESULT_SUCCESS
    )
    .increment(1);

    // Then: the endpoint exposes it in text format
    let mut body = String::new();
    for _ in 0..50 {
        if let Ok(mut stream) = TcpStream::connect("127.0.0.1:19464").await {
            stream
                .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                .await
                .expect("write");
            stream.read_to_string(&mut body).await.expect("read");
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(body.contains("promdriver_scrapes_total"), "body: {body}");
    assert!(body.contains("promdriver_build_info"), "body: {body}");

    // And: a second install is rejected
    let config = MetricsConfig {
        port: 19465,
        ..config
    };
    assert!(metrics_server::install_metrics_recorder(&config).is_err());
}

#[test]
#[serial]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    // Given: an address that is not an IP
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "999.999.999.999".to_owned(),
        port: 9464,
    };

    // When
    let result = metrics_server::install_metrics_recorder(&config);

    // Then
    let err = result.expect_err("invalid address must fail");
    assert!(err.to_string().contains("invalid metrics listen address"));
}

#[test]
fn test_listen_socket_accepts_bare_ipv6() {
    // Given: an IPv6 loopback without brackets
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "::1".to_owned(),
        port: 9464,
    };

    // When
    let addr = metrics_server::listen_socket(&config).expect("::1 is a valid address");

    // Then: rendered with brackets, as a socket address
    assert!(addr.is_ipv6());
    assert_eq!(addr.to_string(), "[::1]:9464");
}

#[test]
fn test_listen_socket_accepts_ipv4() {
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "0.0.0.0".to_owned(),
        port: 0,
    };

    let addr = metrics_server::listen_socket(&config).expect("valid");

    assert!(addr.ip().is_unspecified());
    assert_eq!(addr.port(), 0);
}

#[test]
fn test_listen_socket_rejects_bracketed_address() {
    // Given: brackets belong to socket syntax, not to the bare address
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "[::1]".to_owned(),
        port: 9464,
    };

    // When / Then
    let err = metrics_server::listen_socket(&config).expect_err("brackets are not an IP");
    assert!(err.to_string().contains("invalid metrics listen address"));
}
