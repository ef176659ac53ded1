//! 파서 속성 테스트 (proptest)

use proptest::prelude::*;

use promdriver_core::types::MetricValue;
use promdriver_exposition::parse_text;

proptest! {
    /// 임의의 입력에도 패닉 없이 Ok 또는 Err를 반환합니다.
    #[test]
    fn never_panics_on_arbitrary_input(input in "\\PC{0,200}") {
        let _ = parse_text(&input);
    }

    /// 한 줄짜리 임의 입력도 패닉 없이 처리합니다 (구조 문자 위주).
    #[test]
    fn never_panics_on_structural_noise(input in "[a-z_{}=\",# \\\\\n0-9.+-]{0,120}") {
        let _ = parse_text(&input);
    }

    /// 구분 문자가 없는 레이블 값은 그대로 복원됩니다.
    #[test]
    fn plain_label_values_roundtrip(value in "[a-zA-Z0-9_./:-]{1,40}") {
        let input = format!("m{{v=\"{value}\"}} 1\n");
        let families = parse_text(&input).unwrap();
        prop_assert_eq!(&families["m"].metrics[0].labels["v"], &value);
    }

    /// 순서가 섞인 버킷도 상한 기준으로 정렬된 하나의 인스턴스가 됩니다.
    #[test]
    fn histogram_buckets_are_sorted(bounds in proptest::collection::btree_set(0u32..10_000, 1..12)) {
        let mut input = String::from("# TYPE h histogram\n");
        for bound in bounds.iter().rev() {
            input.push_str(&format!("h_bucket{{le=\"{bound}\"}} {bound}\n"));
        }
        input.push_str("h_sum 1\nh_count 1\n");

        let families = parse_text(&input).unwrap();
        prop_assert_eq!(families["h"].metrics.len(), 1);
        let MetricValue::Histogram(h) = &families["h"].metrics[0].value else {
            panic!("expected histogram");
        };
        let got: Vec<f64> = h.buckets.iter().map(|b| b.upper_bound).collect();
        let want: Vec<f64> = bounds.iter().map(|&b| f64::from(b)).collect();
        prop_assert_eq!(got, want);
    }

    /// 유한한 값은 원래 f64로 복원됩니다.
    #[test]
    fn finite_values_roundtrip(v in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let families = parse_text(&format!("m {v}\n")).unwrap();
        prop_assert_eq!(&families["m"].metrics[0].value, &MetricValue::Scalar(v));
    }
}
