//! 메트릭 모델 변환기: [`MetricFamily`] 하나를 [`NormalizedSeries`] 목록으로 바꿉니다.
//!
//! # 전개 규칙
//! - gauge / counter / untyped: 인스턴스당 포인트 1개, 추가 레이블 없음
//! - summary: `mode=sum`, `mode=count`, 분위수마다 `mode=quantile, quantile=<q>`
//! - histogram: `mode=sum`, `mode=count`, 버킷마다 `mode=bucket, le=<경계>` (누적 개수)
//!
//! 모든 포인트는 GAUGE이며 변환 시각(초 단위)으로 찍힙니다.
//!
//! # 레이블 우선순위 (낮음 → 높음)
//! 인스턴스 레이블 < 전개 레이블 (`mode`, `quantile`, `le`) < 대상 고정 레이블

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use promdriver_core::config::TargetConfig;
use promdriver_core::error::TranslateError;
use promdriver_core::types::{
    Histogram, Labels, MetricFamily, MetricKind, MetricType, MetricValue, NormalizedSeries, Point,
    Summary,
};

use crate::naming::{format_label_float, metric_type_name};

/// 전개 레이블 키
pub const MODE_LABEL: &str = "mode";
pub const QUANTILE_LABEL: &str = "quantile";
pub const BUCKET_LABEL: &str = "le";

/// 패밀리 하나를 변환합니다.
///
/// 모델링하지 않는 타입이거나 인스턴스 페이로드가 패밀리 타입과 맞지 않으면
/// 패밀리 전체가 실패합니다.
pub fn translate(
    family: &MetricFamily,
    target: &TargetConfig,
    now: SystemTime,
) -> Result<Vec<NormalizedSeries>, TranslateError> {
    if let MetricType::Unknown(tag) = &family.metric_type {
        return Err(TranslateError::UnknownMetricType {
            family: family.name.clone(),
            tag: tag.clone(),
        });
    }

    let emitter = Emitter {
        metric_type: metric_type_name(&target.name_prefix, &family.name),
        target,
        end_time: truncate_to_seconds(now),
    };

    let mut out = Vec::with_capacity(family.metrics.len());
    for metric in &family.metrics {
        match (&family.metric_type, &metric.value) {
            (
                MetricType::Gauge | MetricType::Counter | MetricType::Untyped,
                MetricValue::Scalar(value),
            ) => emitter.scalar(&metric.labels, *value, &mut out),
            (MetricType::Summary, MetricValue::Summary(summary)) => {
                emitter.summary(&metric.labels, summary, &mut out)
            }
            (MetricType::Histogram, MetricValue::Histogram(histogram)) => {
                emitter.histogram(&metric.labels, histogram, &mut out)
            }
            (metric_type, _) => {
                return Err(TranslateError::PayloadMismatch {
                    family: family.name.clone(),
                    expected: expected_payload(metric_type),
                });
            }
        }
    }
    Ok(out)
}

fn expected_payload(metric_type: &MetricType) -> &'static str {
    match metric_type {
        MetricType::Summary => "summary",
        MetricType::Histogram => "histogram",
        _ => "scalar",
    }
}

/// 포인트 시각은 초 단위로 잘라냅니다.
fn truncate_to_seconds(now: SystemTime) -> SystemTime {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// 한 패밀리 안에서 공유되는 변환 문맥
struct Emitter<'a> {
    metric_type: String,
    target: &'a TargetConfig,
    end_time: SystemTime,
}

impl Emitter<'_> {
    fn scalar(&self, instance: &Labels, value: f64, out: &mut Vec<NormalizedSeries>) {
        out.push(self.series(instance, &[], value));
    }

    fn summary(&self, instance: &Labels, summary: &Summary, out: &mut Vec<NormalizedSeries>) {
        out.push(self.series(instance, &[(MODE_LABEL, "sum".to_owned())], summary.sample_sum));
        out.push(self.series(
            instance,
            &[(MODE_LABEL, "count".to_owned())],
            summary.sample_count as f64,
        ));
        for q in &summary.quantiles {
            out.push(self.series(
                instance,
                &[
                    (MODE_LABEL, "quantile".to_owned()),
                    (QUANTILE_LABEL, format_label_float(q.quantile)),
                ],
                q.value,
            ));
        }
    }

    fn histogram(&self, instance: &Labels, histogram: &Histogram, out: &mut Vec<NormalizedSeries>) {
        out.push(self.series(instance, &[(MODE_LABEL, "sum".to_owned())], histogram.sample_sum));
        out.push(self.series(
            instance,
            &[(MODE_LABEL, "count".to_owned())],
            histogram.sample_count as f64,
        ));
        for bucket in &histogram.buckets {
            out.push(self.series(
                instance,
                &[
                    (MODE_LABEL, "bucket".to_owned()),
                    (BUCKET_LABEL, format_label_float(bucket.upper_bound)),
                ],
                bucket.cumulative_count as f64,
            ));
        }
    }

    fn series(&self, instance: &Labels, added: &[(&str, String)], value: f64) -> NormalizedSeries {
        let mut labels = instance.clone();
        for (key, val) in added {
            labels.insert((*key).to_owned(), val.clone());
        }
        for (key, val) in &self.target.static_labels {
            labels.insert(key.clone(), val.clone());
        }

        NormalizedSeries {
            metric_type: self.metric_type.clone(),
            metric_kind: MetricKind::Gauge,
            labels,
            resource: self.target.resource.clone(),
            point: Point {
                end_time: self.end_time,
                value,
            },
        }
    }
}
