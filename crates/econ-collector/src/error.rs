//! 에러 타입 정의.

use std::path::PathBuf;

use econ_data::StorageError;
use thiserror::Error;

/// 수집기 에러 타입.
///
/// 검증 실패는 에러가 아니라 `DataQualityMetrics::validation_errors`로 표현됩니다.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 수집기가 해당 파라미터를 지원하지 않거나 등록되지 않음
    #[error("Source unavailable: {collector} cannot serve {parameter}")]
    SourceUnavailable { collector: String, parameter: String },

    /// 업스트림 네트워크/파싱 에러
    #[error("Upstream error from {collector}: {message}")]
    Upstream { collector: String, message: String },

    /// 저장 에러
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CollectorError {
    pub fn upstream(collector: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Upstream {
            collector: collector.into(),
            message: message.to_string(),
        }
    }

    pub fn unavailable(collector: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            collector: collector.into(),
            parameter: parameter.into(),
        }
    }
}

/// 스케줄러 에러 타입.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// 규칙 파일 읽기/쓰기 실패
    #[error("Rule set persistence failed ({path}): {message}")]
    ConfigPersistence { path: PathBuf, message: String },

    /// 등록된 규칙이 없는 파라미터
    #[error("No scheduled update for parameter: {0}")]
    UnknownParameter(String),

    /// 잘못된 규칙 입력
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

impl SchedulerError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::ConfigPersistence {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
