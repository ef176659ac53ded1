//! `projects.timeSeries.create` 요청 본문 (REST JSON)
//!
//! ```json
//! {"timeSeries":[{"metric":{"type":"custom.googleapis.com/x","labels":{}},
//!   "resource":{"type":"global","labels":{}},"metricKind":"GAUGE","valueType":"DOUBLE",
//!   "points":[{"interval":{"endTime":"2024-01-15T12:00:00Z"},"value":{"doubleValue":1.0}}]}]}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use promdriver_core::types::{Labels, MonitoredResource, NormalizedSeries};
use serde::{Serialize, Serializer};

/// 요청 본문 최상위
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTimeSeriesRequest<'a> {
    pub time_series: Vec<TimeSeries<'a>>,
}

impl<'a> CreateTimeSeriesRequest<'a> {
    /// 배치를 요청 본문으로 변환합니다.
    pub fn from_batch(batch: &'a [NormalizedSeries]) -> Self {
        Self {
            time_series: batch.iter().map(TimeSeries::from_series).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeries<'a> {
    pub metric: MetricRef<'a>,
    pub resource: &'a MonitoredResource,
    pub metric_kind: &'static str,
    pub value_type: &'static str,
    pub points: [WirePoint; 1],
}

impl<'a> TimeSeries<'a> {
    fn from_series(series: &'a NormalizedSeries) -> Self {
        let end_time: DateTime<Utc> = series.point.end_time.into();
        Self {
            metric: MetricRef {
                metric_type: &series.metric_type,
                labels: &series.labels,
            },
            resource: series.resource.as_ref(),
            metric_kind: series.metric_kind.as_str(),
            value_type: "DOUBLE",
            points: [WirePoint {
                interval: Interval {
                    end_time: end_time.to_rfc3339_opts(SecondsFormat::Secs, true),
                },
                value: TypedValue {
                    double_value: series.point.value,
                },
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricRef<'a> {
    #[serde(rename = "type")]
    pub metric_type: &'a str,
    pub labels: &'a Labels,
}

#[derive(Debug, Serialize)]
pub struct WirePoint {
    pub interval: Interval,
    pub value: TypedValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub end_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedValue {
    #[serde(serialize_with = "serialize_double")]
    pub double_value: f64,
}

/// proto3 JSON 규칙: 유한하지 않은 double은 문자열로 보냅니다.
fn serialize_double<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if value.is_infinite() {
        serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        serializer.serialize_f64(*value)
    }
}
