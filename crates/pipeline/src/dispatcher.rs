//! 배치 디스패처: 한 사이클의 시계열을 크기 제한이 있는 배치로 나눠 전송합니다.
//!
//! - 배치는 목록 순서대로 연속 구간으로 나뉩니다 (`ceil(K / B)`개).
//! - 실패한 배치는 로그를 남기고 건너뜁니다. 다음 배치 전송은 계속됩니다.
//! - 재시도나 중복 제거는 하지 않습니다 (at-most-once).

use std::sync::Arc;

use promdriver_core::config::MAX_BATCH_SIZE;
use promdriver_core::pipeline::Sink;
use promdriver_core::types::NormalizedSeries;
use tracing::{debug, warn};

/// 한 번의 디스패치 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// 성공한 배치 수
    pub batches_sent: usize,
    /// 실패한 배치 수
    pub batches_failed: usize,
    /// 성공한 배치에 담긴 시계열 수
    pub series_sent: usize,
}

impl DispatchReport {
    /// 시도한 전체 배치 수
    pub fn batches_total(&self) -> usize {
        self.batches_sent + self.batches_failed
    }
}

/// [`Sink`] 위의 배치 분할기
pub struct Dispatcher<S> {
    sink: Arc<S>,
    batch_size: usize,
}

impl<S: Sink> Dispatcher<S> {
    /// 배치 크기는 `1..=200`으로 제한됩니다.
    pub fn new(sink: Arc<S>, batch_size: usize) -> Self {
        Self {
            sink,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// 실제 적용되는 배치 크기
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// `series`를 `project`로 전송합니다.
    pub async fn dispatch(&self, project: &str, series: &[NormalizedSeries]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (index, batch) in series.chunks(self.batch_size).enumerate() {
            match self.sink.send(project, batch).await {
                Ok(()) => {
                    debug!(project, batch = index, series = batch.len(), "batch sent");
                    report.batches_sent += 1;
                    report.series_sent += batch.len();
                }
                Err(e) => {
                    warn!(
                        project,
                        batch = index,
                        series = batch.len(),
                        error = %e,
                        "failed to send batch, dropping"
                    );
                    report.batches_failed += 1;
                }
            }
        }

        report
    }
}
