//! 정규화된 시계열 관측값.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 전국 단위 파라미터에 사용하는 지역 코드.
pub const NATIONAL: &str = "NATIONAL";

/// 정규화된 단일 관측값.
///
/// 자연키는 `(parameter_name, geographic_code, date)`이며, 저장소는 이 키로 upsert 합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// 관측 날짜
    pub date: NaiveDate,
    /// 관측값 (`None` = 결측)
    pub value: Option<f64>,
    /// 파라미터 이름 (예: treasury_10y)
    pub parameter_name: String,
    /// 지역 코드 (NATIONAL 또는 MSA 코드)
    pub geographic_code: String,
    /// 데이터 출처 (예: FRED)
    pub data_source: String,
}

impl DataPoint {
    /// 새 관측값 생성.
    pub fn new(
        date: NaiveDate,
        value: Option<f64>,
        parameter_name: impl Into<String>,
        geographic_code: impl Into<String>,
        data_source: impl Into<String>,
    ) -> Self {
        Self {
            date,
            value,
            parameter_name: parameter_name.into(),
            geographic_code: geographic_code.into(),
            data_source: data_source.into(),
        }
    }

    /// 자연키.
    pub fn natural_key(&self) -> (String, String, NaiveDate) {
        (
            self.parameter_name.clone(),
            self.geographic_code.clone(),
            self.date,
        )
    }

    /// 결측 여부 (`None` 또는 유한하지 않은 값).
    pub fn is_missing(&self) -> bool {
        !matches!(self.value, Some(v) if v.is_finite())
    }
}

/// 기대 값 범위 (양 끝 포함).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// 값이 범위 안에 있는지 확인.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// 파라미터의 지역 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeographicScope {
    /// 전국 단일 시계열 (NATIONAL 작업 1개)
    National,
    /// 지역(MSA)별 시계열 (요청 지역마다 작업 1개)
    Metro,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_inclusive() {
        let range = ValueRange::new(0.0, 0.2);
        assert!(range.contains(0.0));
        assert!(range.contains(0.2));
        assert!(!range.contains(0.21));
        assert!(!range.contains(-0.01));
    }

    #[test]
    fn test_missing_detection() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let point = DataPoint::new(date, Some(4.1), "treasury_10y", NATIONAL, "FRED");
        assert!(!point.is_missing());

        let missing = DataPoint::new(date, None, "treasury_10y", NATIONAL, "FRED");
        assert!(missing.is_missing());

        let nan = DataPoint::new(date, Some(f64::NAN), "treasury_10y", NATIONAL, "FRED");
        assert!(nan.is_missing());
    }
}
