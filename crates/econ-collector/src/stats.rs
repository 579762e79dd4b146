//! 수집 통계 구조체.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use econ_core::CollectionResult;
use serde::{Deserialize, Serialize};

/// 파라미터별 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterTally {
    /// 성공 작업 수
    pub success: usize,
    /// 실패 작업 수
    pub failed: usize,
    /// 수집된 레코드 수
    pub records: usize,
}

/// 전체 갱신 결과 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSummary {
    /// 총 작업 수
    pub total_jobs: usize,
    /// 성공 작업 수
    pub successful_jobs: usize,
    /// 실패 작업 수
    pub failed_jobs: usize,
    /// 성공률 (0.0 ~ 1.0, 작업이 없으면 0)
    pub success_rate: f64,
    /// 수집된 총 레코드 수
    pub total_records_collected: usize,
    /// 저장된 총 레코드 수
    pub total_records_stored: usize,
    /// 파라미터별 집계
    pub parameter_summary: BTreeMap<String, ParameterTally>,
    /// 실패 작업의 에러 메시지 ("param@geo: message")
    pub errors: Vec<String>,
    /// 갱신 전 생성된 백업 파일
    pub backup_files: Vec<PathBuf>,
    pub timestamp: DateTime<Utc>,
}

impl RefreshSummary {
    /// 수집 결과 목록에서 요약을 만듭니다.
    pub fn from_results(results: &[CollectionResult], backup_files: Vec<PathBuf>) -> Self {
        let mut parameter_summary: BTreeMap<String, ParameterTally> = BTreeMap::new();
        let mut errors = Vec::new();
        let mut successful_jobs = 0;
        let mut total_records_collected = 0;
        let mut total_records_stored = 0;

        for result in results {
            let tally = parameter_summary
                .entry(result.job.parameter_name.clone())
                .or_default();

            if result.success {
                successful_jobs += 1;
                tally.success += 1;
            } else {
                tally.failed += 1;
                errors.push(format!(
                    "{}@{}: {}",
                    result.job.parameter_name,
                    result.job.geographic_code,
                    result.error_message.as_deref().unwrap_or("unknown collection error")
                ));
            }

            tally.records += result.records_collected;
            total_records_collected += result.records_collected;
            total_records_stored += result.records_stored;
        }

        let total_jobs = results.len();
        Self {
            total_jobs,
            successful_jobs,
            failed_jobs: total_jobs - successful_jobs,
            success_rate: if total_jobs == 0 {
                0.0
            } else {
                successful_jobs as f64 / total_jobs as f64
            },
            total_records_collected,
            total_records_stored,
            parameter_summary,
            errors,
            backup_files,
            timestamp: Utc::now(),
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total_jobs,
            success = self.successful_jobs,
            failed = self.failed_jobs,
            records_collected = self.total_records_collected,
            records_stored = self.total_records_stored,
            backups = self.backup_files.len(),
            success_rate = format!("{:.1}%", self.success_rate * 100.0),
            "수집 완료"
        );
        for error in &self.errors {
            tracing::warn!(operation = operation, "{}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use econ_core::{assess_quality, CollectionJob, CollectionOutcome, Frequency, ValueRange, NATIONAL};

    fn job(parameter: &str, geography: &str) -> CollectionJob {
        CollectionJob {
            parameter_name: parameter.to_string(),
            geographic_code: geography.to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            collector_name: "FRED".to_string(),
            destination: "interest_rates".to_string(),
            expected_value_range: ValueRange::new(0.0, 20.0),
            expected_frequency: Frequency::Weekly,
        }
    }

    fn outcome(records: usize) -> CollectionOutcome {
        CollectionOutcome {
            records_collected: records,
            records_stored: records,
            quality_metrics: assess_quality(&[], &ValueRange::new(0.0, 20.0), Frequency::Weekly),
        }
    }

    #[test]
    fn test_empty_results() {
        let summary = RefreshSummary::from_results(&[], Vec::new());
        assert_eq!(summary.total_jobs, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.parameter_summary.is_empty());
    }

    #[test]
    fn test_mixed_results() {
        let results = vec![
            CollectionResult::succeeded(job("treasury_10y", NATIONAL), outcome(120)),
            CollectionResult::succeeded(job("fed_funds_rate", NATIONAL), outcome(24)),
            CollectionResult::failed(job("treasury_10y", "35620"), "timeout"),
            CollectionResult::succeeded(job("treasury_10y", "31080"), outcome(10)),
        ];

        let summary = RefreshSummary::from_results(&results, Vec::new());
        assert_eq!(summary.total_jobs, 4);
        assert_eq!(summary.successful_jobs, 3);
        assert_eq!(summary.failed_jobs, 1);
        assert!((summary.success_rate - 0.75).abs() < 1e-9);
        assert_eq!(summary.total_records_collected, 154);
        assert_eq!(summary.errors, vec!["treasury_10y@35620: timeout".to_string()]);

        let treasury = &summary.parameter_summary["treasury_10y"];
        assert_eq!(
            treasury,
            &ParameterTally {
                success: 2,
                failed: 1,
                records: 130
            }
        );
    }
}
