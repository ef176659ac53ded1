//! Prometheus 텍스트 포맷 디코더 (version 0.0.4)
//!
//! 줄 단위 파싱은 `prometheus-parse` 크레이트가 담당하고, 이 모듈은 그 결과를
//! [`Families`] 모델로 옮깁니다.
//!
//! # 형식
//! ```text
//! # HELP http_requests_total The total number of HTTP requests.
//! # TYPE http_requests_total counter
//! http_requests_total{method="post",code="200"} 1027 1395066363000
//! ```
//!
//! - 타임스탬프는 허용하되 버립니다. 포인트 시각은 변환 시점에 정해집니다.
//! - summary/histogram의 `_sum`, `_count`, `_bucket`, quantile 샘플은
//!   `quantile`/`le`를 제외한 레이블 집합 단위로 하나의 인스턴스로 묶습니다.
//! - `# TYPE`이 없는 샘플은 untyped 패밀리가 됩니다.
//! - 모델링하지 않는 `# TYPE` 토큰은 [`MetricType::Unknown`]으로 보존합니다.
//!
//! # 사용 예시
//! ```
//! use promdriver_exposition::parser::parse_text;
//!
//! let families = parse_text("# TYPE up gauge\nup{job=\"node\"} 1\n").unwrap();
//! assert_eq!(families["up"].metrics.len(), 1);
//! ```

use std::collections::HashMap;

use promdriver_core::error::FetchError;
use promdriver_core::pipeline::Families;
use promdriver_core::types::{
    Bucket, Histogram, Labels, Metric, MetricFamily, MetricType, MetricValue, Quantile, Summary,
};
use prometheus_parse::{Scrape, Value};

const QUANTILE_LABEL: &str = "quantile";
const BUCKET_LABEL: &str = "le";

/// 텍스트 포맷 페이로드 전체를 패밀리 단위로 디코딩합니다.
///
/// 줄 번호가 있는 에러([`FetchError::Parse`])는 1부터 셉니다.
/// 샘플을 하나도 얻지 못한 비어 있지 않은 본문은 첫 샘플 줄에서 실패합니다.
pub fn parse_text(input: &str) -> Result<Families, FetchError> {
    let declared = declared_types(input)?;
    let scrape =
        Scrape::parse(input.lines().map(|line| Ok(line.to_owned()))).map_err(|e| {
            FetchError::Parse {
                line: 1,
                reason: e.to_string(),
            }
        })?;

    if scrape.samples.is_empty() {
        if let Some(line) = first_sample_line(input) {
            return Err(FetchError::Parse {
                line,
                reason: "not in text exposition format".to_owned(),
            });
        }
    }

    let mut families: HashMap<String, FamilyBuilder> = HashMap::new();
    for (name, token) in &declared {
        families.entry(name.clone()).or_default().metric_type = Some(MetricType::from_token(token));
    }
    for (name, help) in scrape.docs {
        families.entry(name).or_default().help = Some(help);
    }

    for sample in scrape.samples {
        let (family, role) = resolve(&declared, &sample.metric);
        let builder = families.entry(family.to_owned()).or_default();
        let (value, fallback) = match sample.value {
            Value::Summary(counts) => {
                builder.seen.get_or_insert(MetricType::Summary);
                let summary = builder
                    .summaries
                    .entry(instance_labels(&sample.labels, QUANTILE_LABEL));
                summary
                    .quantiles
                    .extend(counts.into_iter().map(|c| Quantile {
                        quantile: c.quantile,
                        value: c.count,
                    }));
                continue;
            }
            Value::Histogram(counts) => {
                builder.seen.get_or_insert(MetricType::Histogram);
                let histogram = builder
                    .histograms
                    .entry(instance_labels(&sample.labels, BUCKET_LABEL));
                for c in counts {
                    histogram.buckets.push(Bucket {
                        upper_bound: c.less_than,
                        cumulative_count: to_count(family, c.count)?,
                    });
                }
                continue;
            }
            Value::Counter(v) => (v, MetricType::Counter),
            Value::Gauge(v) => (v, MetricType::Gauge),
            Value::Untyped(v) => (v, MetricType::Untyped),
        };
        fold_scalar(builder, family, role, &sample.labels, value)?;
        if role == Role::Plain {
            builder.seen.get_or_insert(fallback);
        }
    }

    Ok(families
        .into_iter()
        .map(|(name, builder)| {
            let family = builder.build(name.clone());
            (name, family)
        })
        .collect())
}

// ─── TYPE 선언 ──────────────────────────────────────────────────────

/// `# TYPE` 선언을 모읍니다. 같은 이름의 두 번째 선언은 에러입니다.
fn declared_types(input: &str) -> Result<HashMap<String, String>, FetchError> {
    let mut declared = HashMap::new();
    for (index, raw) in input.lines().enumerate() {
        let mut tokens = raw.split_whitespace();
        if tokens.next() != Some("#") || tokens.next() != Some("TYPE") {
            continue;
        }
        let line = index + 1;
        let (Some(name), Some(token)) = (tokens.next(), tokens.next()) else {
            return Err(FetchError::Parse {
                line,
                reason: "TYPE line needs a metric name and a type".to_owned(),
            });
        };
        if declared.insert(name.to_owned(), token.to_owned()).is_some() {
            return Err(FetchError::Parse {
                line,
                reason: format!("second TYPE line for metric '{name}'"),
            });
        }
    }
    Ok(declared)
}

/// 주석도 빈 줄도 아닌 첫 줄의 번호
fn first_sample_line(input: &str) -> Option<usize> {
    input
        .lines()
        .position(|raw| {
            let line = raw.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|index| index + 1)
}

// ─── 패밀리 누적 ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Plain,
    Sum,
    Count,
    Bucket,
    Quantile,
}

/// 샘플 이름을 소속 패밀리와 역할로 나눕니다.
///
/// 접미사는 기준 이름이 summary/histogram으로 선언된 경우에만 접습니다.
fn resolve<'a>(declared: &HashMap<String, String>, name: &'a str) -> (&'a str, Role) {
    if let Some(token) = declared.get(name) {
        let role = if token == "summary" {
            Role::Quantile
        } else {
            Role::Plain
        };
        return (name, role);
    }
    for (suffix, role) in [("_sum", Role::Sum), ("_count", Role::Count), ("_bucket", Role::Bucket)] {
        let Some(base) = name.strip_suffix(suffix) else {
            continue;
        };
        match declared.get(base).map(String::as_str) {
            Some("histogram") => return (base, role),
            Some("summary") if role != Role::Bucket => return (base, role),
            _ => {}
        }
    }
    (name, Role::Plain)
}

fn fold_scalar(
    builder: &mut FamilyBuilder,
    family: &str,
    role: Role,
    labels: &prometheus_parse::Labels,
    value: f64,
) -> Result<(), FetchError> {
    let is_histogram = builder.metric_type == Some(MetricType::Histogram);
    match role {
        Role::Plain => builder.scalars.push(Metric {
            labels: instance_labels(labels, ""),
            value: MetricValue::Scalar(value),
        }),
        Role::Quantile => {
            let quantile = label_float(family, labels, QUANTILE_LABEL)?;
            builder
                .summaries
                .entry(instance_labels(labels, QUANTILE_LABEL))
                .quantiles
                .push(Quantile { quantile, value });
        }
        Role::Bucket => {
            let upper_bound = label_float(family, labels, BUCKET_LABEL)?;
            let cumulative_count = to_count(family, value)?;
            builder
                .histograms
                .entry(instance_labels(labels, BUCKET_LABEL))
                .buckets
                .push(Bucket {
                    upper_bound,
                    cumulative_count,
                });
        }
        Role::Sum if is_histogram => {
            builder.histograms.entry(instance_labels(labels, "")).sample_sum = value;
        }
        Role::Sum => builder.summaries.entry(instance_labels(labels, "")).sample_sum = value,
        Role::Count => {
            let count = to_count(family, value)?;
            if is_histogram {
                builder.histograms.entry(instance_labels(labels, "")).sample_count = count;
            } else {
                builder.summaries.entry(instance_labels(labels, "")).sample_count = count;
            }
        }
    }
    Ok(())
}

#[derive(Default)]
struct FamilyBuilder {
    help: Option<String>,
    /// `# TYPE` 선언
    metric_type: Option<MetricType>,
    /// 선언이 없을 때 샘플 값 종류로 정한 타입
    seen: Option<MetricType>,
    scalars: Vec<Metric>,
    summaries: Grouped<Summary>,
    histograms: Grouped<Histogram>,
}

impl FamilyBuilder {
    fn build(self, name: String) -> MetricFamily {
        let metric_type = self
            .metric_type
            .or(self.seen)
            .unwrap_or(MetricType::Untyped);
        let metrics = match metric_type {
            MetricType::Summary => self.summaries.into_metrics(|mut summary| {
                summary
                    .quantiles
                    .sort_by(|a, b| a.quantile.total_cmp(&b.quantile));
                MetricValue::Summary(summary)
            }),
            MetricType::Histogram => self.histograms.into_metrics(|mut histogram| {
                histogram
                    .buckets
                    .sort_by(|a, b| a.upper_bound.total_cmp(&b.upper_bound));
                MetricValue::Histogram(histogram)
            }),
            _ => self.scalars,
        };
        MetricFamily {
            name,
            help: self.help,
            metric_type,
            metrics,
        }
    }
}

/// 레이블 집합별로 묶이는 인스턴스 (첫 등장 순서 유지)
struct Grouped<T> {
    entries: Vec<(Labels, T)>,
    index: HashMap<Labels, usize>,
}

impl<T> Default for Grouped<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Default> Grouped<T> {
    fn entry(&mut self, labels: Labels) -> &mut T {
        let slot = match self.index.get(&labels) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.index.insert(labels.clone(), slot);
                self.entries.push((labels, T::default()));
                slot
            }
        };
        &mut self.entries[slot].1
    }

    fn into_metrics(self, wrap: impl Fn(T) -> MetricValue) -> Vec<Metric> {
        self.entries
            .into_iter()
            .map(|(labels, value)| Metric {
                labels,
                value: wrap(value),
            })
            .collect()
    }
}

// ─── 값 변환 ────────────────────────────────────────────────────────

/// 크레이트 레이블을 정렬된 [`Labels`]로 옮기며 `skip` 키는 뺍니다.
fn instance_labels(labels: &prometheus_parse::Labels, skip: &str) -> Labels {
    labels
        .iter()
        .map(|(key, value)| (key.trim(), value))
        .filter(|(key, _)| !key.is_empty() && *key != skip)
        .map(|(key, value)| (key.to_owned(), value.clone()))
        .collect()
}

fn label_float(
    family: &str,
    labels: &prometheus_parse::Labels,
    key: &str,
) -> Result<f64, FetchError> {
    let raw = labels
        .iter()
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| FetchError::Sample {
            family: family.to_owned(),
            reason: format!("missing '{key}' label"),
        })?;
    raw.parse::<f64>().map_err(|_| FetchError::Sample {
        family: family.to_owned(),
        reason: format!("invalid '{key}' value '{raw}'"),
    })
}

fn to_count(family: &str, value: f64) -> Result<u64, FetchError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value as u64)
    } else {
        Err(FetchError::Sample {
            family: family.to_owned(),
            reason: format!("invalid count value '{value}'"),
        })
    }
}
