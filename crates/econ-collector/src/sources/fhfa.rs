//! FHFA 주택가격지수 기반 자산 가치 상승률 수집기.
//!
//! FRED에 게시된 FHFA All-Transactions HPI(분기)를 조회해 전년 동기 대비 상승률
//! (0.05 = 5%)로 변환합니다. 지역은 MSA 코드(5자리) 또는 `NATIONAL`입니다.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use econ_core::{collectors, DataPoint, NATIONAL};

use super::fred::{FredClient, Observation};
use crate::collector::DataCollector;
use crate::{CollectorError, Result};

const PARAMETER: &str = "property_growth";
const NATIONAL_SERIES: &str = "USSTHPI";

/// FHFA 수집기.
pub struct FhfaCollector {
    client: Arc<FredClient>,
}

impl FhfaCollector {
    pub fn new(client: Arc<FredClient>) -> Self {
        Self { client }
    }

    /// 지역 코드 → HPI 시리즈 ID.
    fn series_id(geography: &str) -> Option<String> {
        if geography == NATIONAL {
            return Some(NATIONAL_SERIES.to_string());
        }
        let is_msa = geography.len() == 5 && geography.chars().all(|c| c.is_ascii_digit());
        is_msa.then(|| format!("ATNHPIUS{}Q", geography))
    }
}

/// 지수 시계열을 전년 동기 대비 상승률로 변환합니다.
///
/// 1년 전 관측값이 없거나 결측이면 해당 시점은 결측으로 남습니다.
pub(crate) fn year_over_year(index: &[Observation]) -> Vec<Observation> {
    let by_date: BTreeMap<NaiveDate, Option<f64>> = index.iter().copied().collect();

    index
        .iter()
        .map(|&(date, value)| {
            let prior = date
                .checked_sub_months(Months::new(12))
                .and_then(|d| by_date.get(&d).copied().flatten());
            let growth = match (value, prior) {
                (Some(current), Some(prior)) if prior != 0.0 => Some(current / prior - 1.0),
                _ => None,
            };
            (date, growth)
        })
        .collect()
}

#[async_trait]
impl DataCollector for FhfaCollector {
    fn name(&self) -> &str {
        collectors::FHFA
    }

    fn available_parameters(&self) -> Vec<&str> {
        vec![PARAMETER]
    }

    fn supported_geographies(&self) -> Vec<&str> {
        // MSA 코드는 목록으로 선언하지 않음
        Vec::new()
    }

    async fn collect_data(
        &self,
        parameter: &str,
        geography: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        if parameter != PARAMETER {
            return Err(CollectorError::unavailable(self.name(), parameter));
        }
        let series_id = Self::series_id(geography)
            .ok_or_else(|| CollectorError::unavailable(self.name(), parameter))?;

        // 첫 분기의 상승률 계산을 위해 1년 앞서 조회
        let fetch_start = start.checked_sub_months(Months::new(12)).unwrap_or(start);
        let index = self
            .client
            .fetch_observations(&series_id, fetch_start, end)
            .await?;

        Ok(year_over_year(&index)
            .into_iter()
            .filter(|(date, _)| *date >= start && *date <= end)
            .map(|(date, value)| DataPoint::new(date, value, parameter, geography, self.name()))
            .collect())
    }
}
