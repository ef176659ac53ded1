//! promdriver 공통 크레이트
//!
//! 수집 → 변환 → 전송 파이프라인의 모든 크레이트가 공유하는 데이터 모델,
//! 설정, 에러 분류, 협력자 trait, 자체 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{
    ConfigError, ErrorKind, FetchError, PromdriverError, SinkError, TranslateError,
};

// 설정
pub use config::{
    CredentialsMode, PromdriverConfig, TargetConfig, TargetSpec, TranslateErrorPolicy,
};

// 파이프라인 trait
pub use pipeline::{Families, Fetcher, Sink};

// 도메인 타입
pub use types::{
    Labels, Metric, MetricFamily, MetricKind, MetricType, MetricValue, MonitoredResource,
    NormalizedSeries, Point,
};
