//! 수집 시스템 공통 에러 타입.
//!
//! 크레이트별 에러(`StorageError`, `CollectorError` 등)가 공유하는 기본 분류를 정의합니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum EconError {
    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 핵심 도메인 작업을 위한 Result 타입.
pub type EconResult<T> = Result<T, EconError>;
