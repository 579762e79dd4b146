//! 수집 작업과 결과 타입.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::frequency::Frequency;
use super::series::ValueRange;

/// 수집 작업 단위.
///
/// 한 번 생성되면 변경되지 않습니다. 동일한 [`JobKey`]를 가진 작업의 재제출은
/// 저장소 upsert 덕분에 멱등입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionJob {
    pub parameter_name: String,
    pub geographic_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub collector_name: String,
    /// 저장 테이블 (파라미터 이름으로만 결정됨)
    pub destination: String,
    pub expected_value_range: ValueRange,
    /// 선언된 관측 주기 (날짜 간격 점검 기준)
    pub expected_frequency: Frequency,
}

/// 작업 식별자.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub parameter_name: String,
    pub geographic_code: String,
    pub collector_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CollectionJob {
    /// 작업 식별자 반환.
    pub fn key(&self) -> JobKey {
        JobKey {
            parameter_name: self.parameter_name.clone(),
            geographic_code: self.geographic_code.clone(),
            collector_name: self.collector_name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

impl std::fmt::Display for CollectionJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{} via {} [{}..{}]",
            self.parameter_name,
            self.geographic_code,
            self.collector_name,
            self.start_date,
            self.end_date
        )
    }
}

/// 데이터 품질 지표.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityMetrics {
    pub total_records: usize,
    pub missing_values: usize,
    /// 결측이 아닌 값의 비율 (0-100)
    pub completeness_pct: f64,
    /// 첫 관측일, 마지막 관측일
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// 기대 범위를 벗어난 값의 수
    pub outliers_detected: usize,
    /// 선언된 주기의 허용 간격을 넘는 날짜 간격 수 (참고용)
    pub date_gaps: usize,
    pub collection_timestamp: DateTime<Utc>,
    /// 비어 있지 않으면 저장하지 않음
    pub validation_errors: Vec<String>,
}

impl DataQualityMetrics {
    /// 검증 통과 여부.
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// `collect_and_validate` 한 번의 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionOutcome {
    /// 업스트림에서 가져온 레코드 수
    pub records_collected: usize,
    /// 실제로 저장된 레코드 수 (검증 실패 시 0)
    pub records_stored: usize,
    pub quality_metrics: DataQualityMetrics,
}

/// 작업별 실행 결과. 작업마다 정확히 하나씩 생성됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionResult {
    pub job: CollectionJob,
    pub success: bool,
    /// 가져온 레코드 수. 저장 여부는 `records_stored`로 확인합니다.
    pub records_collected: usize,
    pub records_stored: usize,
    pub quality_metrics: Option<DataQualityMetrics>,
    pub error_message: Option<String>,
}

impl CollectionResult {
    /// 성공 결과 생성.
    pub fn succeeded(job: CollectionJob, outcome: CollectionOutcome) -> Self {
        Self {
            job,
            success: true,
            records_collected: outcome.records_collected,
            records_stored: outcome.records_stored,
            quality_metrics: Some(outcome.quality_metrics),
            error_message: None,
        }
    }

    /// 실패 결과 생성. 빈 메시지는 대체 문구로 채워집니다.
    pub fn failed(job: CollectionJob, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = "unknown collection error".to_string();
        }
        Self {
            job,
            success: false,
            records_collected: 0,
            records_stored: 0,
            quality_metrics: None,
            error_message: Some(message),
        }
    }

    /// 검증 실패로 저장이 생략되었는지 여부.
    pub fn was_rejected(&self) -> bool {
        self.success
            && self
                .quality_metrics
                .as_ref()
                .is_some_and(|m| !m.is_valid())
    }
}
