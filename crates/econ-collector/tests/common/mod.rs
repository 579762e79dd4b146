//! 통합 테스트 공용 가짜 수집기와 헬퍼.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use econ_collector::{CollectorError, CollectorRegistry, DataCollector, Result};
use econ_core::{collectors, route_for, DataPoint, PARAMETER_ROUTES};

/// 가짜 수집기의 `collect_data` 응답 방식.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// 기대 범위 안의 관측값 `points`개 반환
    Healthy,
    /// 업스트림 에러 반환
    Fail(String),
    /// 수집 태스크 안에서 패닉
    Panic,
    /// 기대 범위를 벗어난 관측값 반환
    OutOfRange,
}

pub struct FakeCollector {
    name: &'static str,
    parameters: Vec<&'static str>,
    points: usize,
    behavior: Behavior,
    /// `behavior`를 적용할 파라미터 (나머지는 정상)
    target: Option<&'static str>,
    /// 호출마다 응답 전 대기 시간
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeCollector {
    /// 라우팅 테이블에서 `name`에 배정된 모든 파라미터를 지원하는 가짜 수집기.
    pub fn for_family(name: &'static str) -> Self {
        Self {
            name,
            parameters: PARAMETER_ROUTES
                .iter()
                .filter(|r| r.collector == name)
                .map(|r| r.parameter)
                .collect(),
            points: 6,
            behavior: Behavior::Healthy,
            target: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_points(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    /// 모든 파라미터에 `behavior` 적용.
    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self.target = None;
        self
    }

    /// 파라미터 하나에만 `behavior` 적용.
    pub fn with_behavior_for(mut self, parameter: &'static str, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self.target = Some(parameter);
        self
    }

    /// 느린 업스트림 흉내.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 동시에 진행된 `collect_data` 호출 수의 최댓값.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataCollector for FakeCollector {
    fn name(&self) -> &str {
        self.name
    }

    fn available_parameters(&self) -> Vec<&str> {
        self.parameters.clone()
    }

    fn supported_geographies(&self) -> Vec<&str> {
        Vec::new()
    }

    async fn collect_data(
        &self,
        parameter: &str,
        geography: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
        if !self.serves(parameter) {
            return Err(CollectorError::unavailable(self.name, parameter));
        }

        let behavior = match self.target {
            Some(target) if target != parameter => Behavior::Healthy,
            _ => self.behavior.clone(),
        };

        let range = route_for(parameter)
            .map(|r| r.expected_range)
            .ok_or_else(|| CollectorError::unavailable(self.name, parameter))?;
        let value = match behavior {
            Behavior::Healthy => (range.min + range.max) / 2.0,
            Behavior::OutOfRange => range.max + 100.0,
            Behavior::Fail(message) => return Err(CollectorError::upstream(self.name, message)),
            Behavior::Panic => panic!("collector {} exploded on {}", self.name, parameter),
        };

        Ok((0..self.points)
            .map(|i| {
                DataPoint::new(
                    start + Days::new(i as u64 * 7),
                    Some(value),
                    parameter,
                    geography,
                    self.name,
                )
            })
            .collect())
    }
}

/// 수집기 계열마다 정상 가짜 수집기를 등록한 레지스트리.
pub fn full_registry() -> Arc<CollectorRegistry> {
    let registry = Arc::new(CollectorRegistry::new());
    for name in [
        collectors::FRED,
        collectors::ENHANCED_REAL_ESTATE,
        collectors::BLS,
        collectors::FHFA,
        collectors::LENDING,
    ] {
        registry.register(Arc::new(FakeCollector::for_family(name)));
    }
    registry
}

/// 테스트용 날짜.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 뉴욕, 로스앤젤레스 MSA 코드.
pub fn metros() -> Vec<String> {
    vec!["35620".to_string(), "31080".to_string()]
}
