//! 인증 토큰 공급자
//!
//! [`TokenSource`]는 요청마다 `Authorization: Bearer` 헤더에 쓸 토큰을 돌려줍니다.
//! `None`이면 헤더 없이 전송합니다 (에뮬레이터, 테스트).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use promdriver_core::config::CredentialsMode;
use promdriver_core::error::SinkError;
use tracing::info;

/// 시계열 기록에 필요한 OAuth 스코프
pub const MONITORING_WRITE_SCOPE: &str = "https://www.googleapis.com/auth/monitoring.write";

/// 액세스 토큰 공급자 trait
pub trait TokenSource: Send + Sync + 'static {
    fn token(&self) -> impl Future<Output = Result<Option<String>, SinkError>> + Send;
}

/// 애플리케이션 기본 자격 증명 (gcp_auth)
///
/// 토큰 캐시와 갱신은 `gcp_auth` provider가 담당합니다.
#[derive(Clone)]
pub struct GcpTokenSource {
    provider: Arc<dyn gcp_auth::TokenProvider>,
}

impl GcpTokenSource {
    /// 환경에서 자격 증명을 찾고, 토큰을 한 번 발급받아 확인합니다.
    pub async fn discover() -> Result<Self, SinkError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| SinkError::Auth(e.to_string()))?;
        let source = Self { provider };
        source.access_token().await?;
        info!(scope = MONITORING_WRITE_SCOPE, "application default credentials loaded");
        Ok(source)
    }

    async fn access_token(&self) -> Result<String, SinkError> {
        let token = self
            .provider
            .token(&[MONITORING_WRITE_SCOPE])
            .await
            .map_err(|e| SinkError::Auth(e.to_string()))?;
        Ok(token.as_str().to_owned())
    }
}

impl fmt::Debug for GcpTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcpTokenSource").finish_non_exhaustive()
    }
}

impl TokenSource for GcpTokenSource {
    async fn token(&self) -> Result<Option<String>, SinkError> {
        self.access_token().await.map(Some)
    }
}

/// 고정 토큰 (테스트, 외부에서 발급한 토큰)
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, SinkError> {
        Ok(Some(self.0.clone()))
    }
}

/// 설정으로 선택되는 자격 증명
#[derive(Debug, Clone)]
pub enum Credentials {
    ApplicationDefault(GcpTokenSource),
    Disabled,
}

impl Credentials {
    /// `sink.credentials` 설정에 맞는 자격 증명을 준비합니다.
    pub async fn from_mode(mode: CredentialsMode) -> Result<Self, SinkError> {
        match mode {
            CredentialsMode::ApplicationDefault => {
                Ok(Self::ApplicationDefault(GcpTokenSource::discover().await?))
            }
            CredentialsMode::Disabled => Ok(Self::Disabled),
        }
    }
}

impl TokenSource for Credentials {
    async fn token(&self) -> Result<Option<String>, SinkError> {
        match self {
            Self::ApplicationDefault(source) => source.token().await,
            Self::Disabled => Ok(None),
        }
    }
}
