//! 저장소 추상화.
//!
//! 저장 테이블(destination) 단위로 관측값을 upsert/조회합니다.
//! 자연키 `(parameter_name, geographic_code, date)`가 같은 레코드는 덮어쓰므로
//! 같은 작업을 여러 번 실행해도 저장 결과는 동일합니다.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use econ_core::DataPoint;

use crate::Result;

/// 조회 필터. 비어 있는 필드는 조건에서 제외됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub parameter_name: Option<String>,
    pub geographic_code: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RecordFilter {
    /// 전체 조회.
    pub fn all() -> Self {
        Self::default()
    }

    /// 파라미터 기준 조회.
    pub fn parameter(parameter_name: impl Into<String>) -> Self {
        Self {
            parameter_name: Some(parameter_name.into()),
            ..Default::default()
        }
    }

    /// 지역 조건 추가.
    pub fn with_geography(mut self, geographic_code: impl Into<String>) -> Self {
        self.geographic_code = Some(geographic_code.into());
        self
    }

    /// 날짜 구간 조건 추가 (양 끝 포함).
    pub fn between(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    /// 레코드가 필터 조건에 맞는지 확인.
    pub fn matches(&self, point: &DataPoint) -> bool {
        self.parameter_name
            .as_deref()
            .map_or(true, |p| p == point.parameter_name)
            && self
                .geographic_code
                .as_deref()
                .map_or(true, |g| g == point.geographic_code)
            && self.start_date.map_or(true, |d| point.date >= d)
            && self.end_date.map_or(true, |d| point.date <= d)
    }
}

/// 저장소 인터페이스.
#[async_trait]
pub trait DataStorage: Send + Sync {
    /// 저장소 이름 (로그용).
    fn name(&self) -> &str;

    /// 레코드를 자연키 기준으로 삽입 또는 교체하고, 기록한 레코드 수를 반환합니다.
    async fn upsert(&self, destination: &str, records: &[DataPoint]) -> Result<usize>;

    /// 필터에 맞는 레코드를 (파라미터, 지역, 날짜) 순으로 반환합니다.
    async fn query(&self, destination: &str, filter: &RecordFilter) -> Result<Vec<DataPoint>>;

    /// 필터에 맞는 가장 최근 관측일.
    async fn latest_date(
        &self,
        destination: &str,
        filter: &RecordFilter,
    ) -> Result<Option<NaiveDate>> {
        let records = self.query(destination, filter).await?;
        Ok(records.iter().map(|r| r.date).max())
    }

    /// 필터에 맞는 레코드 수.
    async fn count(&self, destination: &str, filter: &RecordFilter) -> Result<usize> {
        Ok(self.query(destination, filter).await?.len())
    }
}
