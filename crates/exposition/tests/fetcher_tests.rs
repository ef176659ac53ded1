//! HttpFetcher 통합 테스트 -- 로컬 TCP 리스너로 HTTP 응답을 흉내냅니다.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use promdriver_core::error::FetchError;
use promdriver_core::pipeline::Fetcher;
use promdriver_core::types::{MetricType, MetricValue};
use promdriver_exposition::HttpFetcher;
use promdriver_exposition::fetcher::{ACCEPT_TEXT_FORMAT, USER_AGENT};

/// 요청 하나를 받아 고정 응답을 돌려주는 서버를 띄우고
/// (URL, 수신한 요청 헤더) 를 반환합니다.
async fn serve_once(status_line: &str, body: &str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        stream
            .write_all(response.as_bytes())
            .await
            .expect("write");
        let _ = stream.shutdown().await;
    });

    (format!("http://{addr}/metrics"), rx)
}

#[tokio::test]
async fn fetch_parses_successful_response() {
    let body = "# TYPE http_requests_total counter\nhttp_requests_total{method=\"GET\"} 42\n";
    let (url, request) = serve_once("200 OK", body).await;
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");

    let families = fetcher.fetch(&url).await.expect("fetch should succeed");

    let family = &families["http_requests_total"];
    assert_eq!(family.metric_type, MetricType::Counter);
    assert_eq!(family.metrics[0].value, MetricValue::Scalar(42.0));

    let request = request.await.expect("request").to_ascii_lowercase();
    assert!(request.starts_with("get /metrics"));
    assert!(request.contains(&format!("accept: {}", ACCEPT_TEXT_FORMAT.to_ascii_lowercase())));
    assert!(request.contains(&format!("user-agent: {}", USER_AGENT.to_ascii_lowercase())));
}

#[tokio::test]
async fn fetch_rejects_server_error_status() {
    let (url, _request) = serve_once("500 Internal Server Error", "boom").await;
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");

    let err = fetcher.fetch(&url).await.unwrap_err();

    assert!(
        matches!(err, FetchError::Status { status: 500, .. }),
        "unexpected error: {err:?}"
    );
    assert!(err.to_string().contains("invalid status code"));
}

#[tokio::test]
async fn fetch_rejects_not_found_status() {
    let (url, _request) = serve_once("404 Not Found", "").await;
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn fetch_reports_malformed_payload() {
    let (url, _request) = serve_once("200 OK", "<html>\n<body>login required</body>\n</html>\n").await;
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");

    let err = fetcher.fetch(&url).await.unwrap_err();
    assert!(matches!(err, FetchError::Parse { line: 1, .. }), "{err:?}");
}

#[tokio::test]
async fn fetch_reports_connection_refused() {
    // 바인드 후 즉시 닫아서 비어 있는 포트를 얻습니다.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let fetcher = HttpFetcher::new(Duration::from_secs(2)).expect("client");
    let err = fetcher
        .fetch(&format!("http://{addr}/metrics"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "{err:?}");
}

#[tokio::test]
async fn fetch_times_out_on_silent_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        // 연결만 받고 응답하지 않습니다.
        let (_stream, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let fetcher = HttpFetcher::new(Duration::from_millis(200)).expect("client");
    let err = fetcher
        .fetch(&format!("http://{addr}/metrics"))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "{err:?}");
}
