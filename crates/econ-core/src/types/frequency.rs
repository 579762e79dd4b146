//! 갱신 주기 정의.
//!
//! 스케줄 규칙의 갱신 주기와 주기별 데이터 신선도 임계값을 정의합니다.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 스케줄 규칙 갱신 주기.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// 매일
    Daily,
    /// 매주
    Weekly,
    /// 매월
    Monthly,
    /// 분기마다
    Quarterly,
}

impl Frequency {
    /// 데이터가 오래되었다고 판단하는 경과 일수.
    ///
    /// 스케줄 지연으로 인한 오탐을 피하기 위해 명목 주기보다 넓게 잡습니다.
    pub fn staleness_threshold_days(&self) -> i64 {
        match self {
            Frequency::Daily => 3,
            Frequency::Weekly => 10,
            Frequency::Monthly => 40,
            Frequency::Quarterly => 100,
        }
    }

    /// 관측값 사이의 최대 허용 간격 (명목 주기 + 여유).
    ///
    /// 일간 시계열은 주말과 공휴일을 포함해 4일까지 허용합니다.
    pub fn max_spacing_days(&self) -> i64 {
        match self {
            Frequency::Daily => 4,
            Frequency::Weekly => 10,
            Frequency::Monthly => 35,
            Frequency::Quarterly => 100,
        }
    }

    /// 주어진 날짜에서 한 주기 뒤의 날짜.
    ///
    /// 월/분기 단위는 말일 보정이 적용됩니다 (1/31 + 1개월 = 2/28 또는 2/29).
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        let next = match self {
            Frequency::Daily => date.checked_add_days(Days::new(1)),
            Frequency::Weekly => date.checked_add_days(Days::new(7)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Quarterly => date.checked_add_months(Months::new(3)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    /// 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_staleness_thresholds() {
        assert_eq!(Frequency::Daily.staleness_threshold_days(), 3);
        assert_eq!(Frequency::Weekly.staleness_threshold_days(), 10);
        assert_eq!(Frequency::Monthly.staleness_threshold_days(), 40);
        assert_eq!(Frequency::Quarterly.staleness_threshold_days(), 100);
    }

    #[test]
    fn test_max_spacing_exceeds_nominal_period() {
        assert_eq!(Frequency::Daily.max_spacing_days(), 4);
        assert!(Frequency::Weekly.max_spacing_days() > 7);
        assert!(Frequency::Monthly.max_spacing_days() > 31);
        assert!(Frequency::Quarterly.max_spacing_days() > 92);
    }

    #[test]
    fn test_advance() {
        assert_eq!(Frequency::Daily.advance(date(2024, 2, 28)), date(2024, 2, 29));
        assert_eq!(Frequency::Weekly.advance(date(2024, 1, 1)), date(2024, 1, 8));
        assert_eq!(Frequency::Monthly.advance(date(2024, 1, 31)), date(2024, 2, 29));
        assert_eq!(Frequency::Quarterly.advance(date(2024, 11, 15)), date(2025, 2, 15));
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Frequency::Quarterly).unwrap();
        assert_eq!(json, "\"quarterly\"");

        let parsed: Frequency = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(parsed, Frequency::Weekly);
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("hourly".parse::<Frequency>().is_err());
    }
}
