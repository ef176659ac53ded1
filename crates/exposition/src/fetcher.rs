//! HTTP 수집기: 엔드포인트 하나를 GET으로 가져와 파싱합니다.

use std::time::Duration;

use promdriver_core::error::FetchError;
use promdriver_core::pipeline::{Families, Fetcher};
use tracing::debug;

use crate::parser::parse_text;

/// 수집 요청의 `Accept` 헤더 (텍스트 포맷 0.0.4)
pub const ACCEPT_TEXT_FORMAT: &str = "text/plain;version=0.0.4";

/// 수집 요청의 `User-Agent` 헤더
pub const USER_AGENT: &str = concat!("promdriver/", env!("CARGO_PKG_VERSION"));

/// reqwest 기반 [`Fetcher`] 구현
///
/// 내부 클라이언트는 불변이고 연결 풀을 공유하므로 여러 스크레이프 루프가
/// `Arc`로 하나의 인스턴스를 함께 사용합니다.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// 요청당 `timeout`이 적용된 수집기를 생성합니다.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// 이미 구성된 클라이언트로 수집기를 생성합니다.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Families, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_TEXT_FORMAT)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        let families = parse_text(&body)?;
        debug!(
            url,
            families = families.len(),
            bytes = body.len(),
            "fetched exposition"
        );
        Ok(families)
    }
}
