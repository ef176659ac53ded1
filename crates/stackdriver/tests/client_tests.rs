//! MonitoringClient 통합 테스트 -- 로컬 TCP 리스너가 Cloud Monitoring API를 흉내냅니다.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use promdriver_core::error::SinkError;
use promdriver_core::pipeline::Sink;
use promdriver_core::types::{MetricKind, MonitoredResource, NormalizedSeries, Point, labels};
use promdriver_stackdriver::{Credentials, MonitoringClient, StaticToken};

/// 수신한 요청 (헤더 부분, 본문)
struct Captured {
    head: String,
    body: String,
}

/// 요청 하나를 끝까지 읽고 고정 응답을 돌려주는 서버
async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut buf).await.expect("read");
            assert!(n > 0, "connection closed before headers");
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&request[..header_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        while request.len() < header_end + content_length {
            let n = stream.read(&mut buf).await.expect("read body");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let body = String::from_utf8_lossy(&request[header_end..]).into_owned();
        let _ = tx.send(Captured { head, body });
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write");
        let _ = stream.shutdown().await;
    });

    (format!("http://{addr}"), rx)
}

fn batch() -> Vec<NormalizedSeries> {
    let resource = Arc::new(MonitoredResource {
        resource_type: "gce_instance".to_owned(),
        labels: labels(&[("zone", "us-central1-a")]),
    });
    vec![
        NormalizedSeries {
            metric_type: "custom.googleapis.com/node/up".to_owned(),
            metric_kind: MetricKind::Gauge,
            labels: labels(&[("instance", "a")]),
            resource: resource.clone(),
            point: Point {
                end_time: UNIX_EPOCH + Duration::from_secs(1_705_320_000),
                value: 1.0,
            },
        },
        NormalizedSeries {
            metric_type: "custom.googleapis.com/node/load".to_owned(),
            metric_kind: MetricKind::Gauge,
            labels: labels(&[]),
            resource,
            point: Point {
                end_time: UNIX_EPOCH + Duration::from_secs(1_705_320_000),
                value: 0.5,
            },
        },
    ]
}

#[tokio::test]
async fn send_posts_batch_with_bearer_token() {
    let (endpoint, captured) = serve_once("200 OK", "{}").await;
    let client = MonitoringClient::new(
        &endpoint,
        Duration::from_secs(5),
        StaticToken("ya29.secret".to_owned()),
    )
    .expect("client");

    client.send("my-project", &batch()).await.expect("send");

    let captured = captured.await.expect("request");
    let head = captured.head.to_ascii_lowercase();
    assert!(
        head.starts_with("post /v3/projects/my-project/timeseries "),
        "unexpected request line: {}",
        captured.head
    );
    assert!(head.contains("authorization: bearer ya29.secret"));
    assert!(head.contains("content-type: application/json"));

    let json: serde_json::Value = serde_json::from_str(&captured.body).expect("json body");
    let series = json["timeSeries"].as_array().expect("timeSeries array");
    assert_eq!(series.len(), 2);
    assert_eq!(series[0]["metric"]["type"], "custom.googleapis.com/node/up");
    assert_eq!(series[0]["metric"]["labels"]["instance"], "a");
    assert_eq!(series[0]["resource"]["type"], "gce_instance");
    assert_eq!(series[0]["resource"]["labels"]["zone"], "us-central1-a");
    assert_eq!(series[0]["metricKind"], "GAUGE");
    assert_eq!(series[0]["valueType"], "DOUBLE");
    assert_eq!(
        series[0]["points"][0]["interval"]["endTime"],
        "2024-01-15T12:00:00Z"
    );
    assert_eq!(series[1]["points"][0]["value"]["doubleValue"], 0.5);
}

#[tokio::test]
async fn disabled_credentials_send_no_authorization_header() {
    let (endpoint, captured) = serve_once("200 OK", "{}").await;
    let client = MonitoringClient::new(&endpoint, Duration::from_secs(5), Credentials::Disabled)
        .expect("client");

    client.send("p", &batch()).await.expect("send");

    let head = captured.await.expect("request").head.to_ascii_lowercase();
    assert!(!head.contains("authorization:"));
}

#[tokio::test]
async fn error_status_is_reported_as_rejected() {
    let error_body = r#"{"error":{"code":400,"message":"Field timeSeries[0] had an invalid value"}}"#;
    let (endpoint, _captured) = serve_once("400 Bad Request", error_body).await;
    let client = MonitoringClient::new(&endpoint, Duration::from_secs(5), Credentials::Disabled)
        .expect("client");

    let err = client.send("p", &batch()).await.unwrap_err();

    match err {
        SinkError::Rejected { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid value"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = MonitoringClient::new(
        &format!("http://{addr}"),
        Duration::from_secs(2),
        Credentials::Disabled,
    )
    .expect("client");

    let err = client.send("p", &batch()).await.unwrap_err();

    assert!(
        matches!(err, SinkError::Transport(_)),
        "unexpected error: {err:?}"
    );
}
