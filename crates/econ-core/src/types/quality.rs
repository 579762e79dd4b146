//! 시계열 품질 평가.
//!
//! 결측/이상값/날짜 간격을 계산하고, 임계값을 넘으면 검증 에러로 기록합니다.
//! 검증 실패는 에러가 아니라 데이터입니다.

use chrono::{NaiveDate, Utc};

use super::frequency::Frequency;
use super::job::DataQualityMetrics;
use super::series::{DataPoint, ValueRange};

/// 완전성 최소 기준 (%)
pub const MIN_COMPLETENESS_PCT: f64 = 80.0;
/// 범위 이탈 허용 비율
pub const MAX_OUTLIER_RATE: f64 = 0.10;

/// 시계열을 기대 범위와 선언된 주기에 비교해 품질 지표를 계산합니다.
///
/// 날짜 간격은 참고용이며 검증 에러로 기록하지 않습니다.
pub fn assess_quality(
    series: &[DataPoint],
    expected: &ValueRange,
    frequency: Frequency,
) -> DataQualityMetrics {
    let total_records = series.len();
    let missing_values = series.iter().filter(|p| p.is_missing()).count();
    let present = total_records - missing_values;

    let completeness_pct = if total_records == 0 {
        0.0
    } else {
        present as f64 / total_records as f64 * 100.0
    };

    let outliers_detected = series
        .iter()
        .filter_map(|p| p.value.filter(|v| v.is_finite()))
        .filter(|v| !expected.contains(*v))
        .count();

    let mut dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
    dates.sort_unstable();
    dates.dedup();
    let date_range = dates.first().copied().zip(dates.last().copied());
    let date_gaps = count_date_gaps(&dates, frequency);

    let mut validation_errors = Vec::new();
    if total_records == 0 {
        validation_errors.push("no records in requested range".to_string());
    } else if completeness_pct < MIN_COMPLETENESS_PCT {
        validation_errors.push(format!(
            "completeness {:.1}% below {:.0}% threshold",
            completeness_pct, MIN_COMPLETENESS_PCT
        ));
    }

    if present > 0 {
        let outlier_rate = outliers_detected as f64 / present as f64;
        if outlier_rate > MAX_OUTLIER_RATE {
            validation_errors.push(format!(
                "out-of-range rate {:.1}% exceeds {:.0}% threshold ({} outside [{}, {}])",
                outlier_rate * 100.0,
                MAX_OUTLIER_RATE * 100.0,
                outliers_detected,
                expected.min,
                expected.max
            ));
        }
    }

    DataQualityMetrics {
        total_records,
        missing_values,
        completeness_pct,
        date_range,
        outliers_detected,
        date_gaps,
        collection_timestamp: Utc::now(),
        validation_errors,
    }
}

/// 선언된 주기의 허용 간격을 넘는 관측 간격 수.
fn count_date_gaps(sorted_dates: &[NaiveDate], frequency: Frequency) -> usize {
    let max_spacing = frequency.max_spacing_days();
    sorted_dates
        .windows(2)
        .filter(|w| (w[1] - w[0]).num_days() > max_spacing)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NATIONAL;

    fn monthly_series(values: &[Option<f64>]) -> Vec<DataPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .checked_add_months(chrono::Months::new(i as u32))
                    .unwrap();
                DataPoint::new(date, *v, "treasury_10y", NATIONAL, "FRED")
            })
            .collect()
    }

    #[test]
    fn test_clean_series_passes() {
        let series = monthly_series(&[Some(3.9), Some(4.0), Some(4.2), Some(4.1)]);
        let metrics = assess_quality(&series, &ValueRange::new(0.0, 20.0), Frequency::Monthly);

        assert_eq!(metrics.total_records, 4);
        assert_eq!(metrics.missing_values, 0);
        assert_eq!(metrics.completeness_pct, 100.0);
        assert_eq!(metrics.outliers_detected, 0);
        assert!(metrics.is_valid());
        assert_eq!(
            metrics.date_range,
            Some((
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
            ))
        );
    }

    #[test]
    fn test_low_completeness_flagged() {
        // 5개 중 2개 결측 → 60%
        let series = monthly_series(&[Some(4.0), None, Some(4.1), None, Some(4.2)]);
        let metrics = assess_quality(&series, &ValueRange::new(0.0, 20.0), Frequency::Monthly);

        assert_eq!(metrics.missing_values, 2);
        assert!((metrics.completeness_pct - 60.0).abs() < 1e-9);
        assert_eq!(metrics.validation_errors.len(), 1);
        assert!(metrics.validation_errors[0].contains("completeness"));
    }

    #[test]
    fn test_outlier_rate_flagged() {
        // 10개 중 2개 이탈 → 20%
        let mut values = vec![Some(4.0); 8];
        values.push(Some(45.0));
        values.push(Some(-3.0));
        let metrics = assess_quality(&monthly_series(&values), &ValueRange::new(0.0, 20.0), Frequency::Monthly);

        assert_eq!(metrics.outliers_detected, 2);
        assert!(metrics
            .validation_errors
            .iter()
            .any(|e| e.contains("out-of-range")));
    }

    #[test]
    fn test_outlier_rate_at_threshold_passes() {
        // 10개 중 1개 이탈 → 정확히 10%, 통과
        let mut values = vec![Some(4.0); 9];
        values.push(Some(45.0));
        let metrics = assess_quality(&monthly_series(&values), &ValueRange::new(0.0, 20.0), Frequency::Monthly);

        assert_eq!(metrics.outliers_detected, 1);
        assert!(metrics.is_valid());
    }

    #[test]
    fn test_empty_series_is_invalid_but_not_error() {
        let metrics = assess_quality(&[], &ValueRange::new(0.0, 20.0), Frequency::Monthly);
        assert_eq!(metrics.total_records, 0);
        assert_eq!(metrics.completeness_pct, 0.0);
        assert!(!metrics.is_valid());
        assert_eq!(metrics.date_range, None);
    }

    #[test]
    fn test_date_gap_detection() {
        let dates = [
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        ];
        // 주말(3일)은 허용, 5일 간격은 누락
        assert_eq!(count_date_gaps(&dates, Frequency::Daily), 1);
        assert_eq!(count_date_gaps(&dates, Frequency::Weekly), 0);
    }

    #[test]
    fn test_cadence_mismatch_counts_gaps() {
        // 주간으로 선언된 파라미터에 월간 관측 6개 → 간격 5개 모두 누락
        let series = monthly_series(&[Some(4.0); 6]);
        let metrics = assess_quality(&series, &ValueRange::new(0.0, 20.0), Frequency::Weekly);
        assert_eq!(metrics.date_gaps, 5);
        // 간격은 참고용
        assert!(metrics.is_valid());

        let metrics = assess_quality(&series, &ValueRange::new(0.0, 20.0), Frequency::Monthly);
        assert_eq!(metrics.date_gaps, 0);
    }
}
