//! 수집기 플러그인 인터페이스.
//!
//! 수집기는 외부 데이터 소스 하나를 담당하며, 관측값을
//! `{date, value, parameter_name, geographic_code, data_source}` 형태로 정규화합니다.
//! 업스트림 요청 한도는 각 수집기가 [`RateLimiter`]로 직접 지킵니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use econ_core::{
    assess_quality, CollectionJob, CollectionOutcome, DataPoint, DataQualityMetrics, Frequency,
    ValueRange,
};
use econ_data::DataStorage;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::Result;

/// 수집기가 선언한 지원 범위. 라우팅 검증에만 사용됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorCapabilities {
    pub name: String,
    pub parameters: Vec<String>,
    /// 비어 있으면 모든 지역 지원
    pub geographies: Vec<String>,
}

/// 데이터 수집기 trait.
#[async_trait]
pub trait DataCollector: Send + Sync {
    /// 수집기 이름 (라우팅 테이블의 collector 이름과 일치).
    fn name(&self) -> &str;

    /// 지원하는 파라미터.
    fn available_parameters(&self) -> Vec<&str>;

    /// 지원하는 지역 코드. 빈 목록은 제한 없음을 의미합니다.
    fn supported_geographies(&self) -> Vec<&str>;

    /// 지원 범위 요약.
    fn capabilities(&self) -> CollectorCapabilities {
        CollectorCapabilities {
            name: self.name().to_string(),
            parameters: self
                .available_parameters()
                .into_iter()
                .map(String::from)
                .collect(),
            geographies: self
                .supported_geographies()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    /// 파라미터 지원 여부.
    fn serves(&self, parameter: &str) -> bool {
        self.available_parameters().contains(&parameter)
    }

    /// 지역 지원 여부.
    fn covers(&self, geography: &str) -> bool {
        let geographies = self.supported_geographies();
        geographies.is_empty() || geographies.contains(&geography)
    }

    /// 기간 내 관측값 수집.
    ///
    /// - 지원하지 않는 파라미터: `CollectorError::SourceUnavailable`
    /// - 네트워크/파싱 실패: `CollectorError::Upstream`
    /// - 기간 내 관측값 없음: 빈 벡터 (에러 아님)
    async fn collect_data(
        &self,
        parameter: &str,
        geography: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>>;

    /// 품질 지표 계산. 임계값 위반은 `validation_errors`에 기록되며 에러를 반환하지 않습니다.
    fn validate_data(
        &self,
        series: &[DataPoint],
        expected: &ValueRange,
        frequency: Frequency,
    ) -> DataQualityMetrics {
        assess_quality(series, expected, frequency)
    }

    /// 수집 → 검증 → (검증 통과 시에만) 저장.
    ///
    /// 검증에 실패하면 아무것도 쓰지 않고 `records_stored = 0`인 결과를 돌려줍니다.
    async fn collect_and_validate(
        &self,
        job: &CollectionJob,
        storage: &dyn DataStorage,
    ) -> Result<CollectionOutcome> {
        let series = self
            .collect_data(
                &job.parameter_name,
                &job.geographic_code,
                job.start_date,
                job.end_date,
            )
            .await?;

        let quality_metrics =
            self.validate_data(&series, &job.expected_value_range, job.expected_frequency);
        if !quality_metrics.is_valid() {
            warn!(
                job = %job,
                errors = ?quality_metrics.validation_errors,
                "검증 실패, 저장 생략"
            );
            return Ok(CollectionOutcome {
                records_collected: series.len(),
                records_stored: 0,
                quality_metrics,
            });
        }

        let records_stored = storage.upsert(&job.destination, &series).await?;
        debug!(job = %job, records_stored, "수집 및 저장 완료");

        Ok(CollectionOutcome {
            records_collected: series.len(),
            records_stored,
            quality_metrics,
        })
    }
}

/// 요청 간 최소 간격을 보장하는 수집기별 rate limiter.
///
/// 대기 중에는 잠금을 유지하므로 같은 수집기에 대한 동시 요청은 순차 처리됩니다.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// 직전 요청 이후 `min_interval`이 지날 때까지 대기합니다.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
