//! 대상별 스크레이프 루프
//!
//! 대상 하나당 독립된 tokio 태스크에서 실행되며, 틱마다 다음을 순서대로 수행합니다.
//!
//! ```text
//! tick -> Fetcher -> Filter -> Translator -> Dispatcher -> Sink
//! ```
//!
//! - 첫 사이클은 시작 후 한 주기가 지나서 실행됩니다.
//! - 사이클은 루프 안에서 인라인으로 실행되고 놓친 틱은 건너뛰므로
//!   같은 대상의 사이클은 겹치지 않습니다.
//! - 취소 토큰이 발동되면 진행 중인 사이클은 다음 await 지점에서 폐기됩니다.

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use promdriver_core::config::{TargetConfig, TranslateErrorPolicy};
use promdriver_core::error::PromdriverError;
use promdriver_core::metrics as m;
use promdriver_core::pipeline::{Fetcher, Sink};
use promdriver_core::types::NormalizedSeries;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{DispatchReport, Dispatcher};
use crate::filter;
use crate::translator;

/// 한 사이클의 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// 수집된 패밀리 수
    pub families: usize,
    /// 필터로 제외된 패밀리 수
    pub families_filtered: usize,
    /// 변환에 실패해 버려진 패밀리 수
    pub families_failed: usize,
    /// 변환으로 생성된 시계열 수
    pub series: usize,
    /// 전송 결과
    pub dispatch: DispatchReport,
}

/// 대상 하나의 스크레이프 루프
pub struct ScrapeLoop<F, S> {
    target: TargetConfig,
    fetcher: Arc<F>,
    dispatcher: Dispatcher<S>,
    policy: TranslateErrorPolicy,
}

impl<F: Fetcher, S: Sink> ScrapeLoop<F, S> {
    pub fn new(
        target: TargetConfig,
        fetcher: Arc<F>,
        sink: Arc<S>,
        batch_size: usize,
        policy: TranslateErrorPolicy,
    ) -> Self {
        Self {
            target,
            fetcher,
            dispatcher: Dispatcher::new(sink, batch_size),
            policy,
        }
    }

    /// 이 루프가 담당하는 대상
    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    /// 취소될 때까지 주기적으로 사이클을 실행합니다.
    pub async fn run(self, cancel: CancellationToken) {
        let interval = self.target.poll_interval;
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            url = %self.target.source_url,
            project = %self.target.destination_project,
            interval = ?interval,
            "scrape loop started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(url = %self.target.source_url, "abandoning in-flight cycle");
                            break;
                        }
                        _ = self.tick() => {}
                    }
                }
            }
        }

        info!(url = %self.target.source_url, "scrape loop stopped");
    }

    /// 사이클 하나를 실행하고 결과를 로그와 메트릭으로 남깁니다.
    async fn tick(&self) {
        let started = Instant::now();
        let result = self.run_cycle().await;
        let elapsed = started.elapsed();
        let url = self.target.source_url.clone();

        metrics::histogram!(m::SCRAPE_DURATION_SECONDS, m::LABEL_TARGET => url.clone())
            .record(elapsed.as_secs_f64());

        match result {
            Ok(report) => {
                metrics::counter!(
                    m::SCRAPES_TOTAL,
                    m::LABEL_TARGET => url.clone(),
                    m::LABEL_RESULT => m::RESULT_SUCCESS
                )
                .increment(1);
                debug!(
                    url = %url,
                    families = report.families,
                    filtered = report.families_filtered,
                    series = report.series,
                    batches = report.dispatch.batches_total(),
                    failed_batches = report.dispatch.batches_failed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "cycle completed"
                );
            }
            Err(e) => {
                metrics::counter!(
                    m::SCRAPES_TOTAL,
                    m::LABEL_TARGET => url.clone(),
                    m::LABEL_RESULT => m::RESULT_FAILURE
                )
                .increment(1);
                error!(url = %url, kind = %e.kind(), error = %e, "cycle skipped");
            }
        }
    }

    /// fetch → filter → translate → dispatch를 한 번 수행합니다.
    ///
    /// 수집 실패, 또는 `abort_cycle` 정책에서의 변환 실패는 아무것도 전송하지 않고
    /// 에러를 돌려줍니다. 배치 전송 실패는 [`DispatchReport`]에만 집계됩니다.
    pub async fn run_cycle(&self) -> Result<CycleReport, PromdriverError> {
        let url = self.target.source_url.as_str();
        let families = self.fetcher.fetch(url).await?;

        let now = SystemTime::now();
        let mut report = CycleReport {
            families: families.len(),
            ..CycleReport::default()
        };
        let mut series: Vec<NormalizedSeries> = Vec::new();

        for (name, family) in &families {
            if !filter::matches(name, &self.target.name_pattern) {
                report.families_filtered += 1;
                continue;
            }
            match translator::translate(family, &self.target, now) {
                Ok(mut translated) => series.append(&mut translated),
                Err(e) => {
                    metrics::counter!(m::TRANSLATE_ERRORS_TOTAL, m::LABEL_TARGET => url.to_owned())
                        .increment(1);
                    match self.policy {
                        TranslateErrorPolicy::SkipFamily => {
                            warn!(url, family = %name, error = %e, "skipping family");
                            report.families_failed += 1;
                        }
                        TranslateErrorPolicy::AbortCycle => return Err(e.into()),
                    }
                }
            }
        }

        report.series = series.len();
        metrics::counter!(m::FAMILIES_FILTERED_TOTAL, m::LABEL_TARGET => url.to_owned())
            .increment(report.families_filtered as u64);
        metrics::counter!(m::SERIES_TRANSLATED_TOTAL, m::LABEL_TARGET => url.to_owned())
            .increment(report.series as u64);

        report.dispatch = self
            .dispatcher
            .dispatch(&self.target.destination_project, &series)
            .await;

        let dispatch = &report.dispatch;
        metrics::counter!(
            m::BATCHES_SENT_TOTAL,
            m::LABEL_TARGET => url.to_owned(),
            m::LABEL_RESULT => m::RESULT_SUCCESS
        )
        .increment(dispatch.batches_sent as u64);
        metrics::counter!(
            m::BATCHES_SENT_TOTAL,
            m::LABEL_TARGET => url.to_owned(),
            m::LABEL_RESULT => m::RESULT_FAILURE
        )
        .increment(dispatch.batches_failed as u64);
        metrics::counter!(m::SERIES_SENT_TOTAL, m::LABEL_TARGET => url.to_owned())
            .increment(dispatch.series_sent as u64);

        Ok(report)
    }
}
