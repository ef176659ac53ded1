//! 도메인 타입: 수집 측 메트릭 모델과 전송 측 시계열 모델
//!
//! - 수집 측: [`MetricFamily`] → [`Metric`] → [`MetricValue`]
//! - 전송 측: [`NormalizedSeries`] (항상 GAUGE, 단일 포인트)

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// 레이블 집합
///
/// 키 순서가 결정적이어야 테스트와 로그 출력이 안정적이므로 `BTreeMap`을 사용합니다.
pub type Labels = BTreeMap<String, String>;

/// 수집 측 메트릭 타입 태그
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
    Untyped,
    Summary,
    Histogram,
    /// `# TYPE` 줄에 선언되었지만 모델링하지 않는 타입 (예: `stateset`)
    Unknown(String),
}

impl MetricType {
    /// `# TYPE` 토큰을 타입 태그로 변환합니다.
    pub fn from_token(token: &str) -> Self {
        match token {
            "gauge" => Self::Gauge,
            "counter" => Self::Counter,
            "untyped" => Self::Untyped,
            "summary" => Self::Summary,
            "histogram" => Self::Histogram,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gauge => write!(f, "gauge"),
            Self::Counter => write!(f, "counter"),
            Self::Untyped => write!(f, "untyped"),
            Self::Summary => write!(f, "summary"),
            Self::Histogram => write!(f, "histogram"),
            Self::Unknown(tag) => write!(f, "{tag}"),
        }
    }
}

/// 요약(summary) 분위수
#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

/// 요약(summary) 페이로드
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub sample_sum: f64,
    pub sample_count: u64,
    pub quantiles: Vec<Quantile>,
}

/// 히스토그램 누적 버킷
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

/// 히스토그램 페이로드
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram {
    pub sample_sum: f64,
    pub sample_count: u64,
    pub buckets: Vec<Bucket>,
}

/// 메트릭 인스턴스의 타입별 페이로드
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// gauge / counter / untyped 단일 값
    Scalar(f64),
    Summary(Summary),
    Histogram(Histogram),
}

/// 메트릭 인스턴스: 패밀리 안에서 레이블 집합으로 구분됩니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub labels: Labels,
    pub value: MetricValue,
}

/// 메트릭 패밀리: 한 번의 폴링에서 얻은 읽기 전용 스냅샷
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: Option<String>,
    pub metric_type: MetricType,
    pub metrics: Vec<Metric>,
}

impl MetricFamily {
    /// 빈 패밀리를 생성합니다.
    pub fn new(name: impl Into<String>, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            help: None,
            metric_type,
            metrics: Vec::new(),
        }
    }

    /// 인스턴스를 추가합니다.
    pub fn with_metric(mut self, labels: Labels, value: MetricValue) -> Self {
        self.metrics.push(Metric { labels, value });
        self
    }
}

/// 전송 측 모니터링 리소스
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub labels: Labels,
}

/// 전송 측 메트릭 종류
///
/// 누적 의미를 재구성하지 않으므로 현재 변환기는 항상 `Gauge`를 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

impl MetricKind {
    /// API 표기 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gauge => "GAUGE",
        }
    }
}

/// 단일 데이터 포인트
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// 구간 종료 시각 (변환 시점, 초 단위)
    pub end_time: SystemTime,
    pub value: f64,
}

/// 정규화된 시계열: 변환기가 생성하고 디스패처가 곧바로 소비합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    /// 예: `custom.googleapis.com/api/http_requests_total`
    pub metric_type: String,
    pub metric_kind: MetricKind,
    pub labels: Labels,
    pub resource: Arc<MonitoredResource>,
    pub point: Point,
}

/// 테스트와 예시 코드에서 레이블 집합을 간단히 만듭니다.
///
/// ```
/// let labels = promdriver_core::types::labels(&[("method", "GET")]);
/// assert_eq!(labels["method"], "GET");
/// ```
pub fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}
