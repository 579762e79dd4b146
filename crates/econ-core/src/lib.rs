//! # Econ Core
//!
//! 경제/부동산 파라미터 수집 시스템의 핵심 값 객체와 라우팅 테이블을 제공합니다.
//!
//! 이 크레이트는 수집 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 정규화된 관측값 (`DataPoint`)
//! - 수집 작업 / 결과 / 품질 지표
//! - 스케줄 규칙과 데이터 신선도 리포트
//! - 파라미터 → (수집기, 저장 테이블) 정적 라우팅 테이블
//! - 로깅 인프라

pub mod error;
pub mod logging;
pub mod routing;
pub mod types;

pub use error::*;
pub use logging::*;
pub use routing::*;
pub use types::*;
