//! 스케줄 규칙과 데이터 신선도 리포트.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::frequency::Frequency;

/// 데이터가 한 번도 저장되지 않았을 때의 경과 일수.
pub const NO_DATA_DAYS: i64 = 9999;

/// 파라미터별 반복 갱신 규칙.
///
/// 파라미터 이름당 최대 하나만 존재하며, 변경될 때마다 즉시 영속화됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledUpdate {
    pub parameter_name: String,
    pub geographic_codes: Vec<String>,
    pub frequency: Frequency,
    /// 실행 시각 (UTC, "HH:MM")
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
    pub enabled: bool,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_count: u64,
    #[serde(default)]
    pub error_count: u64,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl ScheduledUpdate {
    /// 활성화 상태의 새 규칙 생성.
    pub fn new(
        parameter_name: impl Into<String>,
        geographic_codes: Vec<String>,
        frequency: Frequency,
        time_of_day: NaiveTime,
    ) -> Self {
        Self {
            parameter_name: parameter_name.into(),
            geographic_codes,
            frequency,
            time_of_day,
            enabled: true,
            last_update: None,
            update_count: 0,
            error_count: 0,
            last_error: None,
        }
    }

    /// 다음 실행 예정 시각.
    ///
    /// 실행 이력이 없으면 오늘의 `time_of_day`, 있으면 마지막 실행일에서
    /// 한 주기 뒤의 `time_of_day`입니다.
    pub fn next_due(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let day = match self.last_update {
            Some(last) => self.frequency.advance(last.date_naive()),
            None => now.date_naive(),
        };
        day.and_time(self.time_of_day).and_utc()
    }

    /// 시간 조건상 실행 대상인지 여부 (비활성 규칙은 항상 false).
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && now >= self.next_due(now)
    }

    /// 실행 결과 기록.
    ///
    /// 실패가 하나라도 있으면 `error_count`에 실패 수를 더하고 `last_error`를 갱신하며,
    /// 전부 성공하면 `last_error`를 지웁니다.
    pub fn record_run(&mut self, at: DateTime<Utc>, total_jobs: usize, failed_jobs: usize) {
        self.last_update = Some(at);
        self.update_count += 1;
        if failed_jobs > 0 {
            self.error_count += failed_jobs as u64;
            self.last_error = Some(format!("{} of {} jobs failed", failed_jobs, total_jobs));
        } else {
            self.last_error = None;
        }
    }
}

/// 신선도에 따른 권장 조치.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendedAction {
    #[serde(rename = "no action")]
    NoAction,
    #[serde(rename = "schedule update soon")]
    ScheduleUpdateSoon,
    #[serde(rename = "urgent: execute immediate update")]
    UrgentImmediateUpdate,
}

impl RecommendedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAction => "no action",
            Self::ScheduleUpdateSoon => "schedule update soon",
            Self::UrgentImmediateUpdate => "urgent: execute immediate update",
        }
    }
}

impl std::fmt::Display for RecommendedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (파라미터, 지역)별 데이터 신선도. 요청 시마다 다시 계산되며 저장하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFreshnessReport {
    pub parameter_name: String,
    pub geographic_code: String,
    pub last_data_date: Option<NaiveDate>,
    pub days_since_update: i64,
    pub is_stale: bool,
    pub recommended_action: RecommendedAction,
}

impl DataFreshnessReport {
    /// 마지막 관측일과 주기로 신선도를 평가합니다.
    pub fn assess(
        parameter_name: impl Into<String>,
        geographic_code: impl Into<String>,
        last_data_date: Option<NaiveDate>,
        today: NaiveDate,
        frequency: Frequency,
    ) -> Self {
        let days_since_update = last_data_date
            .map(|d| (today - d).num_days())
            .unwrap_or(NO_DATA_DAYS);
        let (is_stale, recommended_action) = classify_staleness(days_since_update, frequency);

        Self {
            parameter_name: parameter_name.into(),
            geographic_code: geographic_code.into(),
            last_data_date,
            days_since_update,
            is_stale,
            recommended_action,
        }
    }
}

/// 경과 일수를 주기별 임계값과 비교합니다.
///
/// 고정 주기에서 경과 일수가 늘어나면 stale 판정은 true → false로 되돌아가지 않습니다.
pub fn classify_staleness(days_since_update: i64, frequency: Frequency) -> (bool, RecommendedAction) {
    let threshold = frequency.staleness_threshold_days();
    if days_since_update <= threshold {
        (false, RecommendedAction::NoAction)
    } else if days_since_update < threshold * 2 {
        (true, RecommendedAction::ScheduleUpdateSoon)
    } else {
        (true, RecommendedAction::UrgentImmediateUpdate)
    }
}

/// `NaiveTime` ↔ "HH:MM" 직렬화.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// "HH:MM" 문자열을 실행 시각으로 파싱합니다.
pub fn parse_time_of_day(s: &str) -> crate::EconResult<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| crate::EconError::InvalidInput(format!("time of day '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn six_am() -> NaiveTime {
        NaiveTime::from_hms_opt(6, 0, 0).unwrap()
    }

    fn rule(frequency: Frequency) -> ScheduledUpdate {
        ScheduledUpdate::new("cap_rate", vec!["35620".to_string()], frequency, six_am())
    }

    #[test]
    fn test_monthly_scenarios() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let report = DataFreshnessReport::assess(
            "cap_rate",
            "35620",
            Some(today - chrono::Duration::days(50)),
            today,
            Frequency::Monthly,
        );
        assert!(report.is_stale);
        assert_eq!(report.days_since_update, 50);
        assert_eq!(report.recommended_action.as_str(), "schedule update soon");

        let report = DataFreshnessReport::assess(
            "cap_rate",
            "35620",
            Some(today - chrono::Duration::days(85)),
            today,
            Frequency::Monthly,
        );
        assert_eq!(
            report.recommended_action.as_str(),
            "urgent: execute immediate update"
        );
    }

    #[test]
    fn test_no_data_is_urgent() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let report = DataFreshnessReport::assess("ltv_ratio", "NATIONAL", None, today, Frequency::Quarterly);
        assert_eq!(report.days_since_update, NO_DATA_DAYS);
        assert!(report.is_stale);
        assert_eq!(report.recommended_action, RecommendedAction::UrgentImmediateUpdate);
    }

    #[test]
    fn test_fresh_boundary() {
        assert_eq!(
            classify_staleness(10, Frequency::Weekly),
            (false, RecommendedAction::NoAction)
        );
        assert_eq!(
            classify_staleness(11, Frequency::Weekly),
            (true, RecommendedAction::ScheduleUpdateSoon)
        );
        assert_eq!(
            classify_staleness(20, Frequency::Weekly),
            (true, RecommendedAction::UrgentImmediateUpdate)
        );
    }

    #[test]
    fn test_never_run_rule_due_after_time_of_day() {
        let rule = rule(Frequency::Weekly);
        let before = Utc.with_ymd_and_hms(2024, 3, 1, 5, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        assert!(!rule.is_due(before));
        assert!(rule.is_due(after));
    }

    #[test]
    fn test_due_after_one_period() {
        let mut rule = rule(Frequency::Monthly);
        rule.last_update = Some(Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 5).unwrap());

        assert!(!rule.is_due(Utc.with_ymd_and_hms(2024, 2, 14, 23, 0, 0).unwrap()));
        assert!(rule.is_due(Utc.with_ymd_and_hms(2024, 2, 15, 6, 0, 0).unwrap()));

        rule.enabled = false;
        assert!(!rule.is_due(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_record_run_bookkeeping() {
        let mut rule = rule(Frequency::Weekly);
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();

        rule.record_run(at, 5, 2);
        assert_eq!(rule.update_count, 1);
        assert_eq!(rule.error_count, 2);
        assert_eq!(rule.last_error.as_deref(), Some("2 of 5 jobs failed"));

        rule.record_run(at, 5, 0);
        assert_eq!(rule.update_count, 2);
        assert_eq!(rule.error_count, 2);
        assert!(rule.last_error.is_none());
    }

    #[test]
    fn test_rule_json_shape() {
        let rule = rule(Frequency::Monthly);
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["frequency"], "monthly");
        assert_eq!(json["time_of_day"], "06:00");

        let back: ScheduledUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("06:00").unwrap(), six_am());
        assert!(parse_time_of_day("25:00").is_err());
    }
}
