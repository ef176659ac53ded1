//! 파이프라인 trait: 외부 협력자 경계 정의
//!
//! 스케줄러는 [`Fetcher`]와 [`Sink`]의 시그니처와 실패 모드에만 의존합니다.
//! 운영 환경에서는 HTTP 수집기와 Cloud Monitoring 클라이언트가, 테스트에서는
//! mock 구현이 사용됩니다.

use std::collections::BTreeMap;
use std::future::Future;

use crate::error::{FetchError, SinkError};
use crate::types::{MetricFamily, NormalizedSeries};

/// 패밀리 이름 → 패밀리 매핑
pub type Families = BTreeMap<String, MetricFamily>;

/// 메트릭 수집기 trait
///
/// 주어진 URL에서 텍스트 포맷 페이로드를 가져와 패밀리 단위로 디코딩합니다.
pub trait Fetcher: Send + Sync + 'static {
    /// 엔드포인트를 한 번 수집합니다.
    ///
    /// 전송 실패, 2xx 이외의 상태 코드, 잘못된 페이로드는 모두 에러입니다.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Families, FetchError>> + Send;
}

/// 시계열 전송 trait
///
/// 배치 하나를 원격 API에 기록합니다. 배치 크기 제한은 호출자가 보장합니다.
pub trait Sink: Send + Sync + 'static {
    /// 배치를 `project`에 기록합니다.
    fn send(
        &self,
        project: &str,
        batch: &[NormalizedSeries],
    ) -> impl Future<Output = Result<(), SinkError>> + Send;
}
