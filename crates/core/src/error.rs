//! 에러 타입: 도메인별 에러 정의
//!
//! 파이프라인 단계별로 에러 enum을 나누고, [`PromdriverError`]가 이를 감쌉니다.
//! 런타임 복구 정책은 [`ErrorKind`] 단위로 결정됩니다.

use std::fmt;

/// promdriver 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum PromdriverError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 메트릭 수집 에러
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// 메트릭 변환 에러
    #[error("translate error: {0}")]
    Translate(#[from] TranslateError),

    /// 원격 전송 에러
    #[error("dispatch error: {0}")]
    Dispatch(#[from] SinkError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PromdriverError {
    /// 에러 분류를 반환합니다.
    ///
    /// I/O 에러는 설정 파일을 읽을 때만 발생하므로 `Config`로 분류합니다.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Io(_) => ErrorKind::Config,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Translate(_) => ErrorKind::Translate,
            Self::Dispatch(_) => ErrorKind::Dispatch,
        }
    }
}

/// 에러 분류
///
/// 스케줄러는 이 분류에 따라 사이클 스킵, 패밀리 스킵, 배치 스킵을 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 시작 시점 설정 에러 (치명적)
    Config,
    /// 수집 실패 (사이클 스킵)
    Fetch,
    /// 변환 실패 (정책에 따라 패밀리 또는 사이클 스킵)
    Translate,
    /// 배치 전송 실패 (해당 배치만 스킵)
    Dispatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Fetch => write!(f, "fetch"),
            Self::Translate => write!(f, "translate"),
            Self::Dispatch => write!(f, "dispatch"),
        }
    }
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 메트릭 수집 에러
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP 클라이언트 생성 실패 (시작 시점)
    #[error("failed to build http client: {0}")]
    Client(String),

    /// 네트워크/전송 계층 실패 (연결 거부, 타임아웃 등)
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// 2xx 이외의 HTTP 응답
    #[error("invalid status code {status} from {url}")]
    Status { url: String, status: u16 },

    /// 응답 본문 읽기 실패
    #[error("failed to read body from {url}: {reason}")]
    Body { url: String, reason: String },

    /// 텍스트 포맷 파싱 실패
    #[error("malformed exposition at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// 패밀리 안의 샘플 값이 유효하지 않음 (음수 count 등)
    #[error("invalid sample in family '{family}': {reason}")]
    Sample { family: String, reason: String },
}

/// 메트릭 변환 에러
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// 지원하지 않는 메트릭 타입
    #[error("unknown metric type '{tag}' for family '{family}'")]
    UnknownMetricType { family: String, tag: String },

    /// 패밀리 타입과 인스턴스 페이로드 불일치
    #[error("metric payload mismatch in family '{family}': expected {expected}")]
    PayloadMismatch {
        family: String,
        expected: &'static str,
    },
}

/// 원격 전송(Sink) 에러
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// 네트워크/전송 계층 실패
    #[error("transport failed: {0}")]
    Transport(String),

    /// API가 요청을 거부함
    #[error("request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// 인증 토큰 획득 실패
    #[error("authentication failed: {0}")]
    Auth(String),

    /// 요청 직렬화 실패
    #[error("failed to encode request: {0}")]
    Encode(String),
}
