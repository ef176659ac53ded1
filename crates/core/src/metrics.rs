//! 메트릭 상수 및 설명 등록
//!
//! promdriver 자체 관측용 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수로 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `promdriver_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 대상 레이블 키 (스크레이프 URL)
pub const LABEL_TARGET: &str = "target";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 결과 레이블 값
pub const RESULT_SUCCESS: &str = "success";
pub const RESULT_FAILURE: &str = "failure";

// ─── 스크레이프 메트릭 ──────────────────────────────────────────────

/// 완료된 스크레이프 사이클 수 (counter, labels: target, result)
pub const SCRAPES_TOTAL: &str = "promdriver_scrapes_total";

/// 스크레이프 사이클 소요 시간 (histogram, 초, label: target)
pub const SCRAPE_DURATION_SECONDS: &str = "promdriver_scrape_duration_seconds";

/// 필터로 제외된 패밀리 수 (counter, label: target)
pub const FAMILIES_FILTERED_TOTAL: &str = "promdriver_families_filtered_total";

/// 변환 실패 수 (counter, label: target)
pub const TRANSLATE_ERRORS_TOTAL: &str = "promdriver_translate_errors_total";

/// 변환으로 생성된 시계열 수 (counter, label: target)
pub const SERIES_TRANSLATED_TOTAL: &str = "promdriver_series_translated_total";

// ─── 전송 메트릭 ────────────────────────────────────────────────────

/// 전송한 배치 수 (counter, labels: target, result)
pub const BATCHES_SENT_TOTAL: &str = "promdriver_batches_sent_total";

/// 전송에 성공한 시계열 수 (counter, label: target)
pub const SERIES_SENT_TOTAL: &str = "promdriver_series_sent_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// 실행 중인 스크레이프 루프 수 (gauge)
pub const TARGETS_ACTIVE: &str = "promdriver_targets_active";

/// 빌드 정보 (gauge, 항상 1, label: version)
pub const BUILD_INFO: &str = "promdriver_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스크레이프 사이클 소요 시간 버킷 (초)
///
/// 10ms ~ 60s 범위 (fetch + 전송 네트워크 왕복 포함)
pub const SCRAPE_DURATION_BUCKETS: [f64; 10] =
    [0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        SCRAPES_TOTAL,
        "Total number of scrape cycles by target and result"
    );
    describe_histogram!(
        SCRAPE_DURATION_SECONDS,
        "Time to complete one fetch-translate-dispatch cycle in seconds"
    );
    describe_counter!(
        FAMILIES_FILTERED_TOTAL,
        "Total number of metric families excluded by the target name filter"
    );
    describe_counter!(
        TRANSLATE_ERRORS_TOTAL,
        "Total number of metric families that failed translation"
    );
    describe_counter!(
        SERIES_TRANSLATED_TOTAL,
        "Total number of time series produced by translation"
    );
    describe_counter!(
        BATCHES_SENT_TOTAL,
        "Total number of time series batches sent, by result"
    );
    describe_counter!(
        SERIES_SENT_TOTAL,
        "Total number of time series accepted by the ingestion API"
    );
    describe_gauge!(TARGETS_ACTIVE, "Number of running scrape loops");
    describe_gauge!(BUILD_INFO, "Build information (always 1, with version label)");
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_METRIC_NAMES: &[&str] = &[
        SCRAPES_TOTAL,
        SCRAPE_DURATION_SECONDS,
        FAMILIES_FILTERED_TOTAL,
        TRANSLATE_ERRORS_TOTAL,
        SERIES_TRANSLATED_TOTAL,
        BATCHES_SENT_TOTAL,
        SERIES_SENT_TOTAL,
        TARGETS_ACTIVE,
        BUILD_INFO,
    ];

    #[test]
    fn all_metrics_start_with_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("promdriver_"),
                "Metric '{}' does not start with 'promdriver_' prefix",
                name
            );
        }
    }

    #[test]
    fn counters_end_with_total() {
        for name in [
            SCRAPES_TOTAL,
            FAMILIES_FILTERED_TOTAL,
            TRANSLATE_ERRORS_TOTAL,
            SERIES_TRANSLATED_TOTAL,
            BATCHES_SENT_TOTAL,
            SERIES_SENT_TOTAL,
        ] {
            assert!(name.ends_with("_total"), "counter '{}' lacks _total", name);
        }
    }

    #[test]
    fn describe_all_does_not_panic() {
        describe_all();
    }

    #[test]
    fn scrape_duration_buckets_are_sorted() {
        let buckets = SCRAPE_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }
}
