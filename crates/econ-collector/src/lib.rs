//! Economic parameter collection backbone.
//!
//! 이 crate는 외부 데이터 소스에서 경제/부동산 파라미터를 수집하는 골격을 제공합니다:
//! - 수집기 플러그인 인터페이스와 레지스트리
//! - 라우팅 테이블 기반 수집 계획과 제한된 워커 풀 실행 (오케스트레이터)
//! - 파라미터별 반복 갱신 스케줄러와 데이터 신선도 리포트
//! - 내장 수집기 (FRED 금리, FHFA 자산 가치 상승률)

pub mod collector;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod scheduler;
pub mod sources;
pub mod stats;

pub use collector::{CollectorCapabilities, DataCollector, RateLimiter};
pub use config::CollectorConfig;
pub use error::{CollectorError, Result, SchedulerError};
pub use orchestrator::{DataStatusReport, Orchestrator};
pub use registry::CollectorRegistry;
pub use scheduler::{RuleState, Scheduler, SchedulerStatus, UpdateOutcome, UpdateStatus};
pub use stats::{ParameterTally, RefreshSummary};
