//! promdriver 스크레이프 파이프라인
//!
//! # 모듈 구성
//!
//! - [`filter`]: 패밀리 이름 포함 필터
//! - [`naming`]: 메트릭 타입 이름 정규화, 레이블 값 포맷
//! - [`translator`]: 패밀리 → 정규화 시계열 변환 (quantile/bucket 전개)
//! - [`dispatcher`]: 크기 제한 배치 분할 및 전송
//! - [`scrape_loop`]: 대상별 주기 실행 루프
//!
//! # 아키텍처
//!
//! ```text
//! ScrapeLoop (대상별 태스크)
//!   tick -> Fetcher -> filter -> translator -> Dispatcher -> Sink
//! ```

pub mod dispatcher;
pub mod filter;
pub mod naming;
pub mod scrape_loop;
pub mod translator;

pub use dispatcher::{DispatchReport, Dispatcher};
pub use scrape_loop::{CycleReport, ScrapeLoop};
pub use translator::translate;
