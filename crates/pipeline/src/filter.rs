//! 패밀리 이름 필터
//!
//! 대상마다 설정된 정규식으로 패밀리 전체를 포함하거나 제외합니다.
//! 패턴은 작성된 그대로 평가되며 (암묵적 앵커 없음) 사이클마다 패밀리당 한 번 호출됩니다.

use regex::Regex;

/// 패밀리 이름이 포함 패턴에 일치하는지 확인합니다.
pub fn matches(family_name: &str, pattern: &Regex) -> bool {
    pattern.is_match(family_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_matches_everything_non_empty() {
        let pattern = Regex::new(promdriver_core::config::DEFAULT_NAME_PATTERN).unwrap();
        assert!(matches("up", &pattern));
        assert!(matches("node_cpu_seconds_total", &pattern));
        assert!(!matches("", &pattern));
    }

    #[test]
    fn prefix_pattern() {
        let pattern = Regex::new("^node_").unwrap();
        assert!(matches("node_load1", &pattern));
        assert!(!matches("go_goroutines", &pattern));
    }

    #[test]
    fn pattern_is_unanchored_search() {
        let pattern = Regex::new("seconds").unwrap();
        assert!(matches("http_request_duration_seconds", &pattern));
        assert!(matches("seconds_total", &pattern));
    }
}
