//! FRED (Federal Reserve Economic Data) API 클라이언트와 금리 수집기.
//!
//! `series/observations` 엔드포인트를 JSON으로 조회합니다. FRED는 결측값을 `"."`로
//! 표기하며, 이는 `value = None` 관측값으로 정규화됩니다.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use econ_core::{collectors, DataPoint, NATIONAL};
use serde::Deserialize;
use tracing::debug;

use crate::collector::{DataCollector, RateLimiter};
use crate::{CollectorError, Result};

/// FRED 관측값 하나 (날짜, 값).
pub type Observation = (NaiveDate, Option<f64>);

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error_message: String,
}

/// FRED API 클라이언트.
///
/// FRED와 FHFA 수집기가 같은 API 키 한도를 쓰므로 클라이언트(와 rate limiter)를 공유합니다.
pub struct FredClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: RateLimiter,
}

impl FredClient {
    /// 새 클라이언트 생성.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        request_delay: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CollectorError::upstream(collectors::FRED, e))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(request_delay),
        })
    }

    /// 시리즈 관측값 조회 (기간 양 끝 포함).
    pub async fn fetch_observations(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>> {
        self.limiter.acquire().await;

        let url = format!("{}/series/observations", self.base_url);
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();

        let mut params = HashMap::new();
        params.insert("series_id", series_id);
        params.insert("api_key", self.api_key.as_str());
        params.insert("file_type", "json");
        params.insert("observation_start", start.as_str());
        params.insert("observation_end", end.as_str());

        debug!(series_id, start = %start, end = %end, "FRED API 요청");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| CollectorError::upstream(collectors::FRED, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CollectorError::upstream(collectors::FRED, e))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error_message)
                .unwrap_or(body);
            return Err(CollectorError::upstream(
                collectors::FRED,
                format!("FRED API 오류 [{}]: {} - {}", series_id, status, detail),
            ));
        }

        parse_observations(&body)
    }
}

/// 관측값 응답 파싱. 숫자가 아닌 값(`"."` 등)은 결측으로 처리합니다.
pub(crate) fn parse_observations(body: &str) -> Result<Vec<Observation>> {
    let response: ObservationsResponse = serde_json::from_str(body)
        .map_err(|e| CollectorError::upstream(collectors::FRED, format!("응답 파싱 실패: {}", e)))?;

    response
        .observations
        .into_iter()
        .map(|raw| -> Result<Observation> {
            let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|e| {
                CollectorError::upstream(
                    collectors::FRED,
                    format!("잘못된 날짜 '{}': {}", raw.date, e),
                )
            })?;
            let value = raw.value.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            Ok((date, value))
        })
        .collect()
}

/// 파라미터 → FRED 시리즈 ID.
const RATE_SERIES: [(&str, &str); 3] = [
    ("treasury_10y", "DGS10"),
    ("fed_funds_rate", "DFF"),
    ("commercial_mortgage_rate", "MORTGAGE30US"),
];

/// 금리 수집기 (전국 단위).
pub struct FredCollector {
    client: std::sync::Arc<FredClient>,
}

impl FredCollector {
    pub fn new(client: std::sync::Arc<FredClient>) -> Self {
        Self { client }
    }

    fn series_id(parameter: &str) -> Option<&'static str> {
        RATE_SERIES
            .iter()
            .find(|(p, _)| *p == parameter)
            .map(|(_, series)| *series)
    }
}

#[async_trait]
impl DataCollector for FredCollector {
    fn name(&self) -> &str {
        collectors::FRED
    }

    fn available_parameters(&self) -> Vec<&str> {
        RATE_SERIES.iter().map(|(p, _)| *p).collect()
    }

    fn supported_geographies(&self) -> Vec<&str> {
        vec![NATIONAL]
    }

    async fn collect_data(
        &self,
        parameter: &str,
        geography: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DataPoint>> {
        let series_id = match Self::series_id(parameter) {
            Some(id) if self.covers(geography) => id,
            _ => return Err(CollectorError::unavailable(self.name(), parameter)),
        };

        let observations = self.client.fetch_observations(series_id, start, end).await?;
        Ok(observations
            .into_iter()
            .map(|(date, value)| DataPoint::new(date, value, parameter, geography, self.name()))
            .collect())
    }
}
