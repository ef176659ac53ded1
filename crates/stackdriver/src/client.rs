//! Cloud Monitoring REST 클라이언트
//!
//! 배치 하나를 `POST {endpoint}/v3/projects/{project}/timeSeries` 요청 하나로 보냅니다.
//! 재시도는 하지 않습니다.

use std::time::Duration;

use promdriver_core::error::SinkError;
use promdriver_core::pipeline::Sink;
use promdriver_core::types::NormalizedSeries;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::auth::TokenSource;
use crate::wire::CreateTimeSeriesRequest;

/// 거부 응답 본문을 에러에 담을 때의 최대 길이 (바이트)
const MAX_ERROR_BODY: usize = 512;

const USER_AGENT: &str = concat!("promdriver/", env!("CARGO_PKG_VERSION"));

/// `timeSeries.create` 클라이언트
pub struct MonitoringClient<T> {
    http: reqwest::Client,
    endpoint: String,
    tokens: T,
}

impl<T: TokenSource> MonitoringClient<T> {
    /// # Errors
    ///
    /// HTTP 클라이언트를 만들 수 없으면 [`SinkError::Transport`]를 반환합니다.
    pub fn new(endpoint: &str, timeout: Duration, tokens: T) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            tokens,
        })
    }

    /// 프로젝트의 `timeSeries` 컬렉션 URL
    pub fn url(&self, project: &str) -> String {
        format!("{}/v3/projects/{}/timeSeries", self.endpoint, project)
    }
}

impl<T: TokenSource> Sink for MonitoringClient<T> {
    async fn send(&self, project: &str, batch: &[NormalizedSeries]) -> Result<(), SinkError> {
        let body = serde_json::to_vec(&CreateTimeSeriesRequest::from_batch(batch))
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        let url = self.url(project);

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = self.tokens.token().await? {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY).to_owned(),
            });
        }

        debug!(project, series = batch.len(), "time series written");
        Ok(())
    }
}

/// 문자 경계를 지키며 `max` 바이트 이하로 자릅니다.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
