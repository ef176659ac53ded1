//! 메트릭 이름 정규화 및 레이블 값 포맷
//!
//! # 이름 규칙
//! ```text
//! custom.googleapis.com/<prefix segments...>/<normalized family name>
//! ```
//! 정규화는 소문자로 바꾼 뒤 `[a-z0-9]` 이외 문자의 연속 구간을 `_` 하나로 치환합니다.

/// 사용자 정의 메트릭 타입의 도메인
pub const METRIC_DOMAIN: &str = "custom.googleapis.com";

/// 이름 하나를 정규화합니다. 멱등입니다.
///
/// ```
/// use promdriver_pipeline::naming::normalize_name;
///
/// assert_eq!(normalize_name("HTTP-Requests..Total"), "http_requests_total");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// 접두 세그먼트와 패밀리 이름으로 전송 측 메트릭 타입 이름을 만듭니다.
///
/// 비어 있는 세그먼트는 건너뛰고, 나머지는 선언 순서를 유지합니다.
pub fn metric_type_name(prefix: &[String], family_name: &str) -> String {
    let mut parts = Vec::with_capacity(prefix.len() + 2);
    parts.push(METRIC_DOMAIN.to_owned());
    parts.extend(
        prefix
            .iter()
            .filter(|segment| !segment.is_empty())
            .map(|segment| normalize_name(segment)),
    );
    parts.push(normalize_name(family_name));
    parts.join("/")
}

/// 분위수/버킷 경계 레이블 값을 포맷합니다.
///
/// 최단 자릿수 표기를 쓰고, 10진 지수가 -4 미만이거나 6 이상이면 지수 표기로
/// 바꿉니다 (`1e-05`, `1e+06`). 기존 익스포터가 기록한 버킷 경계와 같은 문자열이 나옵니다.
pub fn format_label_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // `{:e}`는 최단 왕복 자릿수를 `d.ddde[-]x` 형태로 냅니다.
    let sci = format!("{value:e}");
    let (mantissa, exp) = match sci.split_once('e') {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if (-4..6).contains(&exp) {
        format!("{value}")
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    }
}
