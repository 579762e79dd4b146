//! 파라미터별 반복 갱신 스케줄러.
//!
//! 규칙마다 `{enabled, disabled} × {idle, due, running}` 상태를 가집니다.
//! idle → due는 시간(주기 + 실행 시각)으로, due → running → idle은 디스패치로 전이되며
//! enabled/disabled는 운영자가 제어합니다.
//!
//! 백그라운드 루프는 태스크 하나에서 두 개의 interval(규칙 점검, 신선도 점검)을 돌리고
//! `CancellationToken`으로 종료합니다. `stop()`은 루프가 끝날 때까지 기다리므로
//! 반환 이후에는 진행 중인 디스패치가 없습니다.

mod store;

pub use store::{RuleSet, RuleStore};

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Days, NaiveDate, Utc};
use econ_core::{
    collection_span, route_for, DataFreshnessReport, Frequency, GeographicScope,
    RecommendedAction, ScheduledUpdate, NATIONAL, PARAMETER_ROUTES,
};
use econ_data::RecordFilter;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::SchedulerConfig;
use crate::orchestrator::{build_job, Orchestrator};
use crate::SchedulerError;

/// 규칙의 실행 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleState {
    Idle,
    Due,
    Running,
}

/// 디스패치 결과 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// 수집 실행 완료 (개별 작업 실패 포함)
    Completed,
    /// 비활성 규칙, 아무것도 하지 않음
    Disabled,
    /// 같은 파라미터의 디스패치가 이미 진행 중
    AlreadyRunning,
}

/// 디스패치 한 번의 결과.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub parameter_name: String,
    pub status: UpdateStatus,
    pub total_jobs: usize,
    pub successful_jobs: usize,
    pub failed_jobs: usize,
    pub records_collected: usize,
    pub records_stored: usize,
    pub errors: Vec<String>,
}

impl UpdateOutcome {
    fn skipped(parameter_name: &str, status: UpdateStatus) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            status,
            total_jobs: 0,
            successful_jobs: 0,
            failed_jobs: 0,
            records_collected: 0,
            records_stored: 0,
            errors: Vec::new(),
        }
    }
}

/// 규칙별 상태.
#[derive(Debug, Clone, Serialize)]
pub struct RuleStatus {
    pub parameter_name: String,
    pub enabled: bool,
    pub state: RuleState,
    pub frequency: Frequency,
    pub geographic_codes: Vec<String>,
    pub next_due: DateTime<Utc>,
    pub last_update: Option<DateTime<Utc>>,
    pub update_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
}

/// 스케줄러 전체 상태.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    /// 백그라운드 루프 실행 여부
    pub loop_running: bool,
    pub total_rules: usize,
    pub enabled_rules: usize,
    pub rules: Vec<RuleStatus>,
    pub generated_at: DateTime<Utc>,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// 스케줄러.
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
    worker: Mutex<Option<Worker>>,
}

struct SchedulerInner {
    orchestrator: Arc<Orchestrator>,
    store: RuleStore,
    rules: RwLock<RuleSet>,
    running: Mutex<HashSet<String>>,
    config: SchedulerConfig,
}

/// 디스패치 중인 파라미터 표시. drop 시 해제됩니다.
struct RunningGuard<'a> {
    running: &'a Mutex<HashSet<String>>,
    parameter: String,
}

impl<'a> RunningGuard<'a> {
    fn acquire(running: &'a Mutex<HashSet<String>>, parameter: &str) -> Option<Self> {
        let inserted = running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(parameter.to_string());
        inserted.then(|| Self {
            running,
            parameter: parameter.to_string(),
        })
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.parameter);
    }
}

impl Scheduler {
    /// 규칙 파일을 로드하고, 규칙이 없는 파라미터에 기본 규칙을 추가한 뒤 저장합니다.
    pub async fn bootstrap(
        orchestrator: Arc<Orchestrator>,
        config: SchedulerConfig,
    ) -> Result<Self, SchedulerError> {
        let time_of_day = config
            .time_of_day()
            .map_err(|e| SchedulerError::InvalidRule(e.to_string()))?;
        let store = RuleStore::new(&config.schedule_file);
        let mut rules = store.load().await?;

        rules.retain(|name, _| {
            let known = route_for(name).is_some();
            if !known {
                warn!(parameter = %name, "라우팅 테이블에 없는 규칙 제외");
            }
            known
        });

        let mut added = 0;
        for route in PARAMETER_ROUTES.iter() {
            if rules.contains_key(route.parameter) {
                continue;
            }
            let geographies = match route.scope {
                GeographicScope::National => vec![NATIONAL.to_string()],
                GeographicScope::Metro => config.metro_geographies.clone(),
            };
            if geographies.is_empty() {
                warn!(parameter = route.parameter, "지역 목록이 비어 있어 기본 규칙 생략");
                continue;
            }
            rules.insert(
                route.parameter.to_string(),
                ScheduledUpdate::new(
                    route.parameter,
                    geographies,
                    route.default_frequency,
                    time_of_day,
                ),
            );
            added += 1;
        }

        store.save(&rules).await?;
        info!(
            path = %store.path().display(),
            rules = rules.len(),
            defaults_added = added,
            "스케줄러 초기화"
        );

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                orchestrator,
                store,
                rules: RwLock::new(rules),
                running: Mutex::new(HashSet::new()),
                config,
            }),
            worker: Mutex::new(None),
        })
    }

    /// 전체 규칙 (파라미터 이름순).
    pub async fn rules(&self) -> Vec<ScheduledUpdate> {
        self.inner.rules.read().await.values().cloned().collect()
    }

    pub async fn rule(&self, parameter: &str) -> Option<ScheduledUpdate> {
        self.inner.rules.read().await.get(parameter).cloned()
    }

    /// 규칙 추가 (같은 파라미터는 교체). 이전 규칙을 반환합니다.
    pub async fn add_rule(
        &self,
        rule: ScheduledUpdate,
    ) -> Result<Option<ScheduledUpdate>, SchedulerError> {
        if route_for(&rule.parameter_name).is_none() {
            return Err(SchedulerError::UnknownParameter(rule.parameter_name));
        }
        if rule.geographic_codes.is_empty() {
            return Err(SchedulerError::InvalidRule(format!(
                "{}: geographic_codes must not be empty",
                rule.parameter_name
            )));
        }

        let name = rule.parameter_name.clone();
        let previous = self
            .inner
            .mutate(|rules| Ok(rules.insert(name.clone(), rule)))
            .await?;
        info!(parameter = %name, replaced = previous.is_some(), "규칙 추가");
        Ok(previous)
    }

    /// 규칙 삭제.
    pub async fn remove_rule(&self, parameter: &str) -> Result<ScheduledUpdate, SchedulerError> {
        let removed = self
            .inner
            .mutate(|rules| {
                rules
                    .remove(parameter)
                    .ok_or_else(|| SchedulerError::UnknownParameter(parameter.to_string()))
            })
            .await?;
        info!(parameter, "규칙 삭제");
        Ok(removed)
    }

    pub async fn enable_rule(&self, parameter: &str) -> Result<(), SchedulerError> {
        self.set_enabled(parameter, true).await
    }

    pub async fn disable_rule(&self, parameter: &str) -> Result<(), SchedulerError> {
        self.set_enabled(parameter, false).await
    }

    async fn set_enabled(&self, parameter: &str, enabled: bool) -> Result<(), SchedulerError> {
        self.inner
            .mutate(|rules| {
                let rule = rules
                    .get_mut(parameter)
                    .ok_or_else(|| SchedulerError::UnknownParameter(parameter.to_string()))?;
                rule.enabled = enabled;
                Ok(())
            })
            .await?;
        info!(parameter, enabled, "규칙 상태 변경");
        Ok(())
    }

    /// 규칙 하나를 디스패치합니다. 실패는 규칙의 `error_count`/`last_error`로만 드러납니다.
    pub async fn execute_parameter_update(&self, rule: &ScheduledUpdate) -> UpdateOutcome {
        self.inner.execute_parameter_update(rule).await
    }

    /// 시간 조건을 무시하고 즉시 실행.
    pub async fn execute_immediate_update(
        &self,
        parameter: &str,
    ) -> Result<UpdateOutcome, SchedulerError> {
        let rule = self
            .rule(parameter)
            .await
            .ok_or_else(|| SchedulerError::UnknownParameter(parameter.to_string()))?;
        Ok(self.inner.execute_parameter_update(&rule).await)
    }

    /// 모든 규칙을 즉시 실행 (비활성 규칙은 Disabled 결과).
    pub async fn execute_all_updates(&self) -> Vec<UpdateOutcome> {
        let rules = self.rules().await;
        let mut outcomes = Vec::with_capacity(rules.len());
        for rule in &rules {
            outcomes.push(self.inner.execute_parameter_update(rule).await);
        }
        outcomes
    }

    /// `now` 기준 실행 대상 규칙만 디스패치합니다 (폴링 루프 한 번과 동일).
    pub async fn run_due_updates(&self, now: DateTime<Utc>) -> Vec<UpdateOutcome> {
        self.inner.run_due_updates(now).await
    }

    pub async fn get_scheduler_status(&self) -> SchedulerStatus {
        self.get_scheduler_status_at(Utc::now()).await
    }

    pub async fn get_scheduler_status_at(&self, now: DateTime<Utc>) -> SchedulerStatus {
        let rules = self.inner.rules.read().await;
        let statuses: Vec<RuleStatus> = rules
            .values()
            .map(|rule| RuleStatus {
                parameter_name: rule.parameter_name.clone(),
                enabled: rule.enabled,
                state: self.inner.state_of(rule, now),
                frequency: rule.frequency,
                geographic_codes: rule.geographic_codes.clone(),
                next_due: rule.next_due(now),
                last_update: rule.last_update,
                update_count: rule.update_count,
                error_count: rule.error_count,
                last_error: rule.last_error.clone(),
            })
            .collect();

        SchedulerStatus {
            loop_running: self.is_running(),
            total_rules: statuses.len(),
            enabled_rules: statuses.iter().filter(|s| s.enabled).count(),
            rules: statuses,
            generated_at: now,
        }
    }

    /// (규칙, 지역)별 신선도 리포트.
    pub async fn get_data_freshness_report(&self) -> Vec<DataFreshnessReport> {
        self.inner.freshness_report(Utc::now().date_naive()).await
    }

    pub async fn get_data_freshness_report_at(&self, today: NaiveDate) -> Vec<DataFreshnessReport> {
        self.inner.freshness_report(today).await
    }

    /// 백그라운드 루프 시작. 이미 실행 중이면 false.
    pub fn start(&self) -> bool {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            debug!("스케줄러 루프가 이미 실행 중");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(Arc::clone(&self.inner), cancel.clone()));
        *worker = Some(Worker { cancel, handle });

        info!(
            poll_secs = self.inner.config.poll_interval().as_secs(),
            health_secs = self.inner.config.health_check_interval().as_secs(),
            "스케줄러 시작"
        );
        true
    }

    /// 백그라운드 루프 종료. 진행 중인 디스패치가 끝날 때까지 기다립니다.
    pub async fn stop(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return;
        };

        worker.cancel.cancel();
        if let Err(e) = worker.handle.await {
            error!(error = %e, "스케줄러 루프 비정상 종료");
        }
        info!("스케줄러 중지");
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(worker) = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            worker.cancel.cancel();
        }
    }
}

impl SchedulerInner {
    /// 규칙 집합을 변경하고 즉시 저장합니다. 저장 실패 시 변경을 되돌립니다.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut RuleSet) -> Result<T, SchedulerError>,
    ) -> Result<T, SchedulerError> {
        let mut rules = self.rules.write().await;
        let snapshot = rules.clone();
        let value = f(&mut *rules)?;
        if let Err(e) = self.store.save(&rules).await {
            *rules = snapshot;
            return Err(e);
        }
        Ok(value)
    }

    fn is_dispatching(&self, parameter: &str) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(parameter)
    }

    fn state_of(&self, rule: &ScheduledUpdate, now: DateTime<Utc>) -> RuleState {
        if self.is_dispatching(&rule.parameter_name) {
            RuleState::Running
        } else if rule.is_due(now) {
            RuleState::Due
        } else {
            RuleState::Idle
        }
    }

    async fn run_due_updates(&self, now: DateTime<Utc>) -> Vec<UpdateOutcome> {
        let due: Vec<ScheduledUpdate> = {
            let rules = self.rules.read().await;
            rules
                .values()
                .filter(|r| self.state_of(r, now) == RuleState::Due)
                .cloned()
                .collect()
        };

        if due.is_empty() {
            debug!("실행 대상 규칙 없음");
            return Vec::new();
        }

        info!(rules = due.len(), "예약 갱신 실행");
        let mut outcomes = Vec::with_capacity(due.len());
        for rule in &due {
            outcomes.push(self.execute_parameter_update(rule).await);
        }
        outcomes
    }

    async fn execute_parameter_update(&self, rule: &ScheduledUpdate) -> UpdateOutcome {
        let name = rule.parameter_name.as_str();
        if !rule.enabled {
            debug!(parameter = name, "비활성 규칙, 실행 생략");
            return UpdateOutcome::skipped(name, UpdateStatus::Disabled);
        }

        let Some(_guard) = RunningGuard::acquire(&self.running, name) else {
            warn!(parameter = name, "이미 실행 중인 규칙");
            return UpdateOutcome::skipped(name, UpdateStatus::AlreadyRunning);
        };

        let span = collection_span!("scheduled_update", name);
        self.dispatch(rule).instrument(span).await
    }

    async fn dispatch(&self, rule: &ScheduledUpdate) -> UpdateOutcome {
        let name = rule.parameter_name.as_str();
        let today = Utc::now().date_naive();
        let start = today
            .checked_sub_days(Days::new(self.config.lookback_days))
            .unwrap_or(NaiveDate::MIN);

        let jobs = match route_for(name) {
            Some(route) => rule
                .geographic_codes
                .iter()
                .map(|geography| build_job(route, geography, start, today))
                .collect(),
            None => {
                warn!(parameter = name, "라우팅 테이블에 없는 파라미터");
                Vec::new()
            }
        };

        let results = self
            .orchestrator
            .execute_collection_plan(jobs, self.config.max_workers)
            .await;

        let total_jobs = results.len();
        let failed_jobs = results.iter().filter(|r| !r.success).count();
        let outcome = UpdateOutcome {
            parameter_name: name.to_string(),
            status: UpdateStatus::Completed,
            total_jobs,
            successful_jobs: total_jobs - failed_jobs,
            failed_jobs,
            records_collected: results.iter().map(|r| r.records_collected).sum(),
            records_stored: results.iter().map(|r| r.records_stored).sum(),
            errors: results
                .iter()
                .filter_map(|r| {
                    r.error_message
                        .as_ref()
                        .map(|m| format!("{}: {}", r.job.geographic_code, m))
                })
                .collect(),
        };

        {
            let mut rules = self.rules.write().await;
            match rules.get_mut(name) {
                Some(current) => current.record_run(Utc::now(), total_jobs, failed_jobs),
                None => debug!(parameter = name, "실행 중 규칙이 삭제됨"),
            }
            if let Err(e) = self.store.save(&rules).await {
                error!(parameter = name, error = %e, "규칙 저장 실패");
            }
        }

        if failed_jobs > 0 {
            warn!(
                total = total_jobs,
                failed = failed_jobs,
                "예약 갱신 일부 실패"
            );
        } else {
            info!(
                total = total_jobs,
                records = outcome.records_stored,
                "예약 갱신 완료"
            );
        }
        outcome
    }

    async fn freshness_report(&self, today: NaiveDate) -> Vec<DataFreshnessReport> {
        let rules: Vec<ScheduledUpdate> = self.rules.read().await.values().cloned().collect();
        let storage = self.orchestrator.storage();

        let mut reports = Vec::new();
        for rule in &rules {
            let Some(route) = route_for(&rule.parameter_name) else {
                continue;
            };
            for geography in &rule.geographic_codes {
                let filter =
                    RecordFilter::parameter(rule.parameter_name.as_str()).with_geography(geography.as_str());
                let last_data_date = match storage.latest_date(route.destination, &filter).await {
                    Ok(date) => date,
                    Err(e) => {
                        warn!(
                            parameter = %rule.parameter_name,
                            geography = %geography,
                            error = %e,
                            "최근 관측일 조회 실패"
                        );
                        None
                    }
                };
                reports.push(DataFreshnessReport::assess(
                    rule.parameter_name.as_str(),
                    geography.as_str(),
                    last_data_date,
                    today,
                    rule.frequency,
                ));
            }
        }
        reports
    }

    async fn health_check(&self) {
        let reports = self.freshness_report(Utc::now().date_naive()).await;
        let stale = reports.iter().filter(|r| r.is_stale).count();

        for report in reports
            .iter()
            .filter(|r| r.recommended_action == RecommendedAction::UrgentImmediateUpdate)
        {
            warn!(
                parameter = %report.parameter_name,
                geography = %report.geographic_code,
                days_since_update = report.days_since_update,
                action = %report.recommended_action,
                "데이터 갱신 지연"
            );
        }
        info!(checked = reports.len(), stale, "데이터 신선도 점검 완료");
    }
}

async fn run_loop(inner: Arc<SchedulerInner>, cancel: CancellationToken) {
    let mut poll = tokio::time::interval(inner.config.poll_interval());
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut health = tokio::time::interval(inner.config.health_check_interval());
    health.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("스케줄러 루프 종료 신호 수신");
                break;
            }
            _ = poll.tick() => {
                inner.run_due_updates(Utc::now()).await;
            }
            _ = health.tick() => {
                inner.health_check().await;
            }
        }
    }
}
