//! 설정 관리: promdriver.toml 파싱 및 런타임 설정
//!
//! [`PromdriverConfig`]는 데몬 전체 설정을 담는 최상위 구조체이고,
//! [`TargetConfig`]는 검증을 마친 수집 대상 하나를 나타냅니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`PROMDRIVER_SINK_BATCH_SIZE=100` 형식)
//! 3. 설정 파일 (`promdriver.toml`, 또는 레거시 JSON 배열)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), promdriver_core::error::PromdriverError> {
//! use promdriver_core::config::PromdriverConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드 + 검증
//! let config = PromdriverConfig::load("/etc/promdriver/promdriver.toml").await?;
//! let targets = config.targets()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, PromdriverError};
use crate::types::{Labels, MonitoredResource};

/// 필터가 지정되지 않았을 때 사용하는 전체 일치 패턴
pub const DEFAULT_NAME_PATTERN: &str = "^.+$";

/// 대상 프로젝트를 담는 리소스 레이블 키
pub const PROJECT_LABEL: &str = "project_id";

/// Cloud Monitoring API가 요청당 허용하는 최대 시계열 수
pub const MAX_BATCH_SIZE: usize = 200;

/// promdriver 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromdriverConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 수집 설정
    #[serde(default)]
    pub scrape: ScrapeConfig,
    /// 전송 설정
    #[serde(default)]
    pub sink: SinkConfig,
    /// 자체 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 수집 대상 목록
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

impl PromdriverConfig {
    /// 설정 파일을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PromdriverError> {
        let mut config = Self::from_file(path).await?;
        for rejected in config.apply_env_overrides() {
            rejected.log();
        }
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일을 읽어 파싱합니다 (환경변수 오버라이드, 검증 없음).
    ///
    /// 확장자가 `.json`이면 레거시 포맷(대상 객체의 JSON 배열)으로 읽습니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, PromdriverError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PromdriverError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                PromdriverError::Io(e)
            }
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::parse_json_legacy(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, PromdriverError> {
        toml::from_str(toml_str).map_err(|e| {
            PromdriverError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 레거시 JSON 배열 포맷을 파싱합니다. 대상 외의 섹션은 기본값을 사용합니다.
    pub fn parse_json_legacy(json_str: &str) -> Result<Self, PromdriverError> {
        let targets: Vec<TargetSpec> = serde_json::from_str(json_str).map_err(|e| {
            PromdriverError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })?;
        Ok(Self {
            targets,
            ..Self::default()
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `PROMDRIVER_{SECTION}_{FIELD}`
    ///
    /// 파싱할 수 없는 값은 무시하고 기존 값을 유지하며, 반환 목록에 담습니다.
    /// 로깅 초기화 전에 호출될 수 있으므로 경고 출력은 호출자가 맡습니다.
    pub fn apply_env_overrides(&mut self) -> Vec<RejectedOverride> {
        let mut rejected = Vec::new();

        // General
        override_string(
            &mut self.general.log_level,
            "PROMDRIVER_GENERAL_LOG_LEVEL",
        );
        override_string(
            &mut self.general.log_format,
            "PROMDRIVER_GENERAL_LOG_FORMAT",
        );

        // Sink
        override_string(&mut self.sink.endpoint, "PROMDRIVER_SINK_ENDPOINT");
        rejected.extend(override_parsed(
            &mut self.sink.batch_size,
            "PROMDRIVER_SINK_BATCH_SIZE",
            "usize",
        ));

        // Metrics
        rejected.extend(override_parsed(
            &mut self.metrics.enabled,
            "PROMDRIVER_METRICS_ENABLED",
            "bool",
        ));
        rejected.extend(override_parsed(
            &mut self.metrics.port,
            "PROMDRIVER_METRICS_PORT",
            "u16",
        ));
        rejected
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 하나라도 잘못되면 파일 전체를 거부합니다.
    pub fn validate(&self) -> Result<(), PromdriverError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            )
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            )
            .into());
        }

        if self.scrape.timeout.is_zero() {
            return Err(
                ConfigError::invalid("scrape.timeout", "must be greater than zero").into(),
            );
        }

        if !(1..=MAX_BATCH_SIZE).contains(&self.sink.batch_size) {
            return Err(ConfigError::invalid(
                "sink.batch_size",
                format!("must be between 1 and {MAX_BATCH_SIZE}"),
            )
            .into());
        }

        if self.sink.timeout.is_zero() {
            return Err(ConfigError::invalid("sink.timeout", "must be greater than zero").into());
        }

        match url::Url::parse(&self.sink.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::invalid(
                    "sink.endpoint",
                    format!("'{}' is not an http(s) URL", self.sink.endpoint),
                )
                .into());
            }
        }

        if self.metrics.enabled && self.metrics.listen_addr.parse::<std::net::IpAddr>().is_err()
        {
            return Err(ConfigError::invalid(
                "metrics.listen_addr",
                format!("'{}' is not an IP address", self.metrics.listen_addr),
            )
            .into());
        }

        if self.targets.is_empty() {
            return Err(ConfigError::invalid("targets", "at least one target is required").into());
        }

        for (index, spec) in self.targets.iter().enumerate() {
            spec.resolve(index)?;
        }

        Ok(())
    }

    /// 검증된 수집 대상 목록을 생성합니다.
    pub fn targets(&self) -> Result<Vec<TargetConfig>, PromdriverError> {
        self.targets
            .iter()
            .enumerate()
            .map(|(index, spec)| spec.resolve(index).map_err(PromdriverError::from))
            .collect()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 패밀리 변환 실패 시 동작
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslateErrorPolicy {
    /// 실패한 패밀리만 버리고 나머지는 계속 전송
    #[default]
    SkipFamily,
    /// 사이클 전체를 폐기
    AbortCycle,
}

/// 수집 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// 요청당 수집 타임아웃
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// 변환 실패 정책
    pub on_translate_error: TranslateErrorPolicy,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            on_translate_error: TranslateErrorPolicy::default(),
        }
    }
}

/// 인증 방식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialsMode {
    /// 애플리케이션 기본 자격 증명
    #[default]
    #[serde(rename = "application_default")]
    ApplicationDefault,
    /// 인증 헤더 없이 전송 (에뮬레이터, 테스트)
    #[serde(rename = "none")]
    Disabled,
}

/// 전송 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// API 엔드포인트 (스킴 + 호스트)
    pub endpoint: String,
    /// 요청당 최대 시계열 수 (1..=200)
    pub batch_size: usize,
    /// 요청 타임아웃
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// 인증 방식
    pub credentials: CredentialsMode,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://monitoring.googleapis.com".to_owned(),
            batch_size: MAX_BATCH_SIZE,
            timeout: Duration::from_secs(30),
            credentials: CredentialsMode::default(),
        }
    }
}

/// 자체 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9464,
        }
    }
}

/// 설정 파일에 기록된 수집 대상 (검증 전)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// 수집 엔드포인트 URL
    pub target: String,
    /// 수집 주기 (`15s`, `1m30s` 등)
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// 전송 측 리소스
    pub resource: MonitoredResource,
    /// 메트릭 이름/레이블/필터 설정
    #[serde(default)]
    pub metric: MetricSpec,
}

/// 대상별 메트릭 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSpec {
    /// 메트릭 이름 앞에 붙는 경로 세그먼트
    pub prefix: Vec<String>,
    /// 패밀리 이름 포함 필터 (정규식). 비어 있으면 전체 일치.
    pub filter: String,
    /// 모든 시계열에 붙는 고정 레이블
    pub labels: Labels,
}

impl TargetSpec {
    /// 검증 후 [`TargetConfig`]를 생성합니다. `index`는 에러 메시지의 필드 경로에 쓰입니다.
    pub fn resolve(&self, index: usize) -> Result<TargetConfig, ConfigError> {
        let field = |name: &str| format!("targets[{index}].{name}");

        match url::Url::parse(&self.target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ConfigError::invalid(
                    field("target"),
                    format!("unsupported scheme '{}'", url.scheme()),
                ));
            }
            Err(e) => {
                return Err(ConfigError::invalid(
                    field("target"),
                    format!("'{}': {e}", self.target),
                ));
            }
        }

        if self.interval.is_zero() {
            return Err(ConfigError::invalid(
                field("interval"),
                "must be greater than zero",
            ));
        }

        if self.resource.resource_type.is_empty() {
            return Err(ConfigError::invalid(
                field("resource.type"),
                "must not be empty",
            ));
        }

        let project = self
            .resource
            .labels
            .get(PROJECT_LABEL)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ConfigError::invalid(
                    field("resource.labels.project_id"),
                    "destination project is required",
                )
            })?;

        let pattern = if self.metric.filter.is_empty() {
            DEFAULT_NAME_PATTERN
        } else {
            self.metric.filter.as_str()
        };
        let name_pattern = Regex::new(pattern)
            .map_err(|e| ConfigError::invalid(field("metric.filter"), e.to_string()))?;

        Ok(TargetConfig {
            source_url: self.target.clone(),
            resource: Arc::new(self.resource.clone()),
            name_prefix: self.metric.prefix.clone(),
            static_labels: self.metric.labels.clone(),
            name_pattern,
            poll_interval: self.interval,
            destination_project: project.clone(),
        })
    }
}

/// 검증을 마친 수집 대상
///
/// 시작 시 한 번 생성되어 해당 스크레이프 루프가 소유합니다. 이후 재검증하지 않습니다.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub source_url: String,
    pub resource: Arc<MonitoredResource>,
    pub name_prefix: Vec<String>,
    pub static_labels: Labels,
    pub name_pattern: Regex,
    pub poll_interval: Duration,
    pub destination_project: String,
}

impl fmt::Display for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} every {} -> {} ({}, filter {})",
            self.source_url,
            humantime::format_duration(self.poll_interval),
            self.destination_project,
            self.resource.resource_type,
            self.name_pattern.as_str(),
        )
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

/// 타입에 맞게 파싱하여 덮어씁니다. 실패하면 기존 값을 유지합니다.
fn override_parsed<T: std::str::FromStr>(
    target: &mut T,
    env_key: &'static str,
    expected: &'static str,
) -> Option<RejectedOverride> {
    let val = std::env::var(env_key).ok()?;
    match val.parse::<T>() {
        Ok(parsed) => {
            *target = parsed;
            None
        }
        Err(_) => Some(RejectedOverride {
            env_key,
            value: val,
            expected,
        }),
    }
}

/// 파싱에 실패해 무시된 환경변수 오버라이드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    pub env_key: &'static str,
    pub value: String,
    /// 기대한 값의 타입 (`bool`, `u16` 등)
    pub expected: &'static str,
}

impl RejectedOverride {
    /// 경고 로그를 남깁니다.
    pub fn log(&self) {
        warn!(
            env_key = self.env_key,
            value = self.value.as_str(),
            expected = self.expected,
            "failed to parse env var, ignoring"
        );
    }
}

impl fmt::Display for RejectedOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}='{}' is not a valid {}, ignoring",
            self.env_key, self.value, self.expected
        )
    }
}
