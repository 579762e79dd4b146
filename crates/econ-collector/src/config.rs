//! 수집기 설정 모듈.
//!
//! 기본값 → `config/collector.toml` (선택) → `COLLECTOR__*` 환경변수 순서로 덮어씁니다.
//! 예: `COLLECTOR__FRED__API_KEY`, `COLLECTOR__SCHEDULER__POLL_INTERVAL_SECS`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use econ_core::{parse_time_of_day, EconResult};
use serde::{Deserialize, Serialize};

/// 기본 설정 파일 경로
pub const DEFAULT_CONFIG_PATH: &str = "config/collector.toml";

/// Collector 전체 설정
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 저장소 설정
    pub storage: StorageConfig,
    /// FRED API 설정
    pub fred: FredConfig,
    /// 오케스트레이터 설정
    pub orchestrator: OrchestratorConfig,
    /// 스케줄러 설정
    pub scheduler: SchedulerConfig,
}

/// 저장소 설정
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 데이터베이스 URL (없으면 인메모리 저장소 사용)
    pub database_url: Option<String>,
    /// 풀의 최대 연결 수
    pub max_connections: u32,
    /// 전체 갱신 전 백업 디렉토리
    pub backup_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            backup_dir: PathBuf::from("data/backups"),
        }
    }
}

/// FRED API 설정
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FredConfig {
    /// API 키 (없으면 FRED/FHFA 수집기를 등록하지 않음)
    pub api_key: Option<String>,
    /// API 기본 URL
    pub base_url: String,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for FredConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.stlouisfed.org/fred".to_string(),
            request_delay_ms: 500,
        }
    }
}

/// 오케스트레이터 설정
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// 수집 계획 실행 기본 동시성
    pub default_max_workers: usize,
    /// 전체 갱신 동시성
    pub refresh_max_workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_max_workers: 3,
            refresh_max_workers: 3,
        }
    }
}

/// 스케줄러 설정
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 규칙 파일 경로 (JSON)
    pub schedule_file: PathBuf,
    /// 예약 갱신 동시성
    pub max_workers: usize,
    /// 규칙 점검 주기 (초)
    pub poll_interval_secs: u64,
    /// 신선도 점검 주기 (초)
    pub health_check_interval_secs: u64,
    /// 예약 갱신 조회 기간 (일)
    pub lookback_days: u64,
    /// 지역 파라미터 기본 대상 (MSA 코드)
    pub metro_geographies: Vec<String>,
    /// 기본 실행 시각 (HH:MM, UTC)
    pub default_time_of_day: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule_file: PathBuf::from("config/update_schedule.json"),
            max_workers: 2,
            poll_interval_secs: 60,
            health_check_interval_secs: 3600,
            lookback_days: 730,
            metro_geographies: ["35620", "31080", "16980", "47900", "33100"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_time_of_day: "06:00".to_string(),
        }
    }
}

impl CollectorConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다. 파일이 없으면 기본값을 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("COLLECTOR")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scheduler.metro_geographies")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        // 공용 DATABASE_URL 지원
        if config.storage.database_url.is_none() {
            config.storage.database_url = std::env::var("DATABASE_URL").ok();
        }
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }
}

impl FredConfig {
    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl SchedulerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs.max(1))
    }

    /// 기본 실행 시각 파싱
    pub fn time_of_day(&self) -> EconResult<NaiveTime> {
        parse_time_of_day(&self.default_time_of_day)
    }
}
