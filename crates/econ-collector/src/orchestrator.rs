//! 수집 오케스트레이터.
//!
//! 정적 라우팅 테이블로 수집 계획을 만들고, 호출마다 생성되는 제한된 워커 풀에서
//! 작업을 실행합니다. 작업 하나의 실패(패닉 포함)는 실패 결과로 변환되어 다른 작업에
//! 영향을 주지 않습니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use econ_core::{
    collection_span, CollectionJob, CollectionResult, GeographicScope, ParameterRoute, NATIONAL,
    PARAMETER_ROUTES,
};
use econ_data::{BackupService, DataStorage, RecordFilter};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn, Instrument};

use crate::registry::CollectorRegistry;
use crate::stats::RefreshSummary;
use crate::CollectorError;

/// 대화형 호출의 기본 동시성.
pub const DEFAULT_MAX_WORKERS: usize = 3;
/// 전체 갱신 동시성. 모든 소스를 동시에 건드리므로 보수적으로 잡습니다.
pub const REFRESH_MAX_WORKERS: usize = 3;

/// 상태 리포트 (진단용, 계획 수립에는 사용하지 않음).
#[derive(Debug, Clone, Serialize)]
pub struct DataStatusReport {
    pub registered_collectors: Vec<String>,
    /// 프로세스 시작 이후 실행된 작업 수
    pub total_executions: usize,
    pub successful_executions: usize,
    /// 파라미터별 저장 레코드 수 (조회 실패 시 None)
    pub parameter_record_counts: BTreeMap<String, Option<usize>>,
    pub generated_at: DateTime<Utc>,
}

/// 라우팅 정보로 작업 하나를 만듭니다.
pub fn build_job(
    route: &ParameterRoute,
    geography: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> CollectionJob {
    CollectionJob {
        parameter_name: route.parameter.to_string(),
        geographic_code: geography.to_string(),
        start_date: start,
        end_date: end,
        collector_name: route.collector.to_string(),
        destination: route.destination.to_string(),
        expected_value_range: route.expected_range,
        expected_frequency: route.default_frequency,
    }
}

/// 수집 오케스트레이터.
pub struct Orchestrator {
    registry: Arc<CollectorRegistry>,
    storage: Arc<dyn DataStorage>,
    backup: Option<Arc<dyn BackupService>>,
    history: RwLock<Vec<CollectionResult>>,
    default_max_workers: usize,
    refresh_max_workers: usize,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<CollectorRegistry>,
        storage: Arc<dyn DataStorage>,
        backup: Option<Arc<dyn BackupService>>,
    ) -> Self {
        Self {
            registry,
            storage,
            backup,
            history: RwLock::new(Vec::new()),
            default_max_workers: DEFAULT_MAX_WORKERS,
            refresh_max_workers: REFRESH_MAX_WORKERS,
        }
    }

    /// 대화형 수집 동시성 변경.
    pub fn with_default_workers(mut self, workers: usize) -> Self {
        self.default_max_workers = workers.max(1);
        self
    }

    /// 전체 갱신 동시성 변경.
    pub fn with_refresh_workers(mut self, workers: usize) -> Self {
        self.refresh_max_workers = workers.max(1);
        self
    }

    pub fn default_max_workers(&self) -> usize {
        self.default_max_workers
    }

    pub fn registry(&self) -> &Arc<CollectorRegistry> {
        &self.registry
    }

    pub fn storage(&self) -> &Arc<dyn DataStorage> {
        &self.storage
    }

    /// 수집 계획 생성.
    ///
    /// - 전국 파라미터: `NATIONAL` 작업 하나
    /// - 지역 파라미터: 요청된 지역마다 하나 (`NATIONAL`과 중복 지역은 제외)
    /// - 대상 수집기가 등록되어 있지 않거나 파라미터/지역을 지원하지 않으면 작업을 만들지 않음
    pub fn get_collection_plan(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        geographies: &[String],
    ) -> Vec<CollectionJob> {
        if start > end {
            warn!(%start, %end, "잘못된 수집 기간, 빈 계획 반환");
            return Vec::new();
        }

        let mut metros: Vec<&str> = Vec::new();
        for geography in geographies {
            let geography = geography.trim();
            if !geography.is_empty() && geography != NATIONAL && !metros.contains(&geography) {
                metros.push(geography);
            }
        }

        let mut jobs = Vec::new();
        for route in PARAMETER_ROUTES.iter() {
            let Some(collector) = self.registry.get(route.collector) else {
                debug!(
                    parameter = route.parameter,
                    collector = route.collector,
                    "수집기 미등록, 계획에서 제외"
                );
                continue;
            };
            if !collector.serves(route.parameter) {
                debug!(
                    parameter = route.parameter,
                    collector = route.collector,
                    "수집기가 파라미터를 지원하지 않음"
                );
                continue;
            }

            match route.scope {
                GeographicScope::National => {
                    if collector.covers(NATIONAL) {
                        jobs.push(build_job(route, NATIONAL, start, end));
                    }
                }
                GeographicScope::Metro => {
                    for geography in &metros {
                        if collector.covers(geography) {
                            jobs.push(build_job(route, geography, start, end));
                        }
                    }
                }
            }
        }

        info!(
            jobs = jobs.len(),
            geographies = metros.len(),
            collectors = self.registry.len(),
            "수집 계획 생성"
        );
        jobs
    }

    /// 제한된 워커 풀에서 수집 계획 실행.
    ///
    /// 결과는 완료 순서로 반환되며 작업마다 정확히 하나씩 생성됩니다.
    pub async fn execute_collection_plan(
        &self,
        jobs: Vec<CollectionJob>,
        max_workers: usize,
    ) -> Vec<CollectionResult> {
        let total = jobs.len();
        let workers = max_workers.max(1);
        info!(jobs = total, workers, "수집 계획 실행 시작");

        let tasks = jobs.into_iter().map(|job| {
            let registry = Arc::clone(&self.registry);
            let storage = Arc::clone(&self.storage);
            async move {
                let fallback = job.clone();
                match tokio::spawn(run_job(registry, storage, job)).await {
                    Ok(result) => result,
                    Err(e) => {
                        error!(job = %fallback, error = %e, "수집 작업 비정상 종료");
                        CollectionResult::failed(fallback, format!("collection task aborted: {}", e))
                    }
                }
            }
        });

        let results: Vec<CollectionResult> = stream::iter(tasks)
            .buffer_unordered(workers)
            .collect()
            .await;

        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            jobs = total,
            successful = total - failed,
            failed,
            "수집 계획 실행 완료"
        );

        self.history.write().await.extend(results.iter().cloned());
        results
    }

    /// 계획 생성 후 기본 동시성으로 바로 실행 (백업 없음).
    pub async fn collect(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        geographies: &[String],
    ) -> Vec<CollectionResult> {
        let plan = self.get_collection_plan(start, end, geographies);
        self.execute_collection_plan(plan, self.default_max_workers)
            .await
    }

    /// 전체 갱신: 백업 → 계획 → 실행 → 요약. 실패하지 않습니다.
    pub async fn replace_all_mock_data(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        geographies: &[String],
    ) -> RefreshSummary {
        info!(%start, %end, "=== 전체 갱신 시작 ===");

        let backup_files = match &self.backup {
            Some(backup) => match backup.backup_all().await {
                Ok(files) => files,
                Err(e) => {
                    warn!(error = %e, "백업 실패, 갱신은 계속 진행");
                    Vec::new()
                }
            },
            None => {
                debug!("백업 서비스 없음");
                Vec::new()
            }
        };

        let plan = self.get_collection_plan(start, end, geographies);
        let results = self
            .execute_collection_plan(plan, self.refresh_max_workers)
            .await;

        let summary = RefreshSummary::from_results(&results, backup_files);
        summary.log_summary("전체 갱신");
        summary
    }

    /// 상태 리포트.
    pub async fn get_data_status_report(&self) -> DataStatusReport {
        let (total_executions, successful_executions) = {
            let history = self.history.read().await;
            (history.len(), history.iter().filter(|r| r.success).count())
        };

        let mut parameter_record_counts = BTreeMap::new();
        for route in PARAMETER_ROUTES.iter() {
            let count = match self
                .storage
                .count(route.destination, &RecordFilter::parameter(route.parameter))
                .await
            {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(parameter = route.parameter, error = %e, "레코드 수 조회 실패");
                    None
                }
            };
            parameter_record_counts.insert(route.parameter.to_string(), count);
        }

        DataStatusReport {
            registered_collectors: self.registry.names(),
            total_executions,
            successful_executions,
            parameter_record_counts,
            generated_at: Utc::now(),
        }
    }

    /// 실행 이력 스냅샷.
    pub async fn execution_history(&self) -> Vec<CollectionResult> {
        self.history.read().await.clone()
    }
}

/// 작업 하나 실행. 에러는 실패 결과로 변환됩니다.
async fn run_job(
    registry: Arc<CollectorRegistry>,
    storage: Arc<dyn DataStorage>,
    job: CollectionJob,
) -> CollectionResult {
    let span = collection_span!(
        "collect",
        job.parameter_name,
        job.geographic_code,
        job.collector_name
    );

    async move {
        let Some(collector) = registry.get(&job.collector_name) else {
            let err = CollectorError::unavailable(&job.collector_name, &job.parameter_name);
            warn!(error = %err, "수집기 없음");
            return CollectionResult::failed(job, err.to_string());
        };

        match collector.collect_and_validate(&job, storage.as_ref()).await {
            Ok(outcome) => {
                debug!(
                    records_collected = outcome.records_collected,
                    records_stored = outcome.records_stored,
                    "작업 완료"
                );
                CollectionResult::succeeded(job, outcome)
            }
            Err(e) => {
                warn!(error = %e, "작업 실패");
                CollectionResult::failed(job, e.to_string())
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use econ_core::DataPoint;
    use econ_data::MemoryStorage;

    use crate::collector::DataCollector;

    struct RateCollector;

    #[async_trait]
    impl DataCollector for RateCollector {
        fn name(&self) -> &str {
            "FRED"
        }

        fn available_parameters(&self) -> Vec<&str> {
            vec!["treasury_10y", "fed_funds_rate", "commercial_mortgage_rate"]
        }

        fn supported_geographies(&self) -> Vec<&str> {
            vec![NATIONAL]
        }

        async fn collect_data(
            &self,
            parameter: &str,
            geography: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> crate::Result<Vec<DataPoint>> {
            Ok(vec![DataPoint::new(start, Some(4.25), parameter, geography, "FRED")])
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn orchestrator() -> Orchestrator {
        let registry = Arc::new(CollectorRegistry::new());
        registry.register(Arc::new(RateCollector));
        Orchestrator::new(registry, Arc::new(MemoryStorage::new()), None)
    }

    #[test]
    fn test_plan_skips_unregistered_collectors() {
        let plan = orchestrator().get_collection_plan(
            date(2024, 1, 1),
            date(2024, 3, 1),
            &["35620".to_string()],
        );
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|j| j.collector_name == "FRED"));
        assert!(plan.iter().all(|j| j.geographic_code == NATIONAL));
    }

    #[test]
    fn test_plan_rejects_inverted_range() {
        let plan = orchestrator().get_collection_plan(date(2024, 3, 1), date(2024, 1, 1), &[]);
        assert!(plan.is_empty());
    }

    #[tokio::test]
    async fn test_execute_records_history() {
        let orchestrator = orchestrator();
        let plan = orchestrator.get_collection_plan(date(2024, 1, 1), date(2024, 1, 31), &[]);
        let results = orchestrator.execute_collection_plan(plan, 2).await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success && r.records_stored == 1));
        assert_eq!(orchestrator.execution_history().await.len(), 3);

        let report = orchestrator.get_data_status_report().await;
        assert_eq!(report.total_executions, 3);
        assert_eq!(report.registered_collectors, vec!["FRED".to_string()]);
        assert_eq!(report.parameter_record_counts["treasury_10y"], Some(1));
        assert_eq!(report.parameter_record_counts["cap_rate"], Some(0));
    }

    #[tokio::test]
    async fn test_collect_uses_default_workers() {
        let orchestrator = orchestrator().with_default_workers(0);
        assert_eq!(orchestrator.default_max_workers(), 1);

        let results = orchestrator
            .collect(date(2024, 1, 1), date(2024, 1, 31), &[])
            .await;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(
            Orchestrator::new(
                Arc::new(CollectorRegistry::new()),
                Arc::new(MemoryStorage::new()),
                None
            )
            .default_max_workers(),
            DEFAULT_MAX_WORKERS
        );
    }

    #[test]
    fn test_job_carries_route_frequency() {
        let route = econ_core::route_for("ltv_ratio").unwrap();
        let job = build_job(route, NATIONAL, date(2024, 1, 1), date(2024, 3, 31));
        assert_eq!(job.expected_frequency, econ_core::Frequency::Quarterly);
        assert_eq!(job.expected_value_range, route.expected_range);
    }

    #[tokio::test]
    async fn test_missing_collector_becomes_failed_result() {
        let orchestrator = orchestrator();
        let route = econ_core::route_for("cap_rate").unwrap();
        let job = build_job(route, "35620", date(2024, 1, 1), date(2024, 1, 31));

        let results = orchestrator.execute_collection_plan(vec![job], 1).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(results[0]
            .error_message
            .as_deref()
            .unwrap()
            .contains("Enhanced_RealEstate"));
    }
}
