//! promdriver 메트릭 수집
//!
//! # 모듈 구성
//!
//! - [`parser`]: `prometheus-parse` 기반 텍스트 포맷 디코더 ([`parse_text`])
//! - [`fetcher`]: reqwest 기반 HTTP 수집기 ([`HttpFetcher`])

pub mod fetcher;
pub mod parser;

pub use fetcher::HttpFetcher;
pub use parser::parse_text;
