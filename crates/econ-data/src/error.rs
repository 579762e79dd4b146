//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 저장소 관련 오류.
#[derive(Debug, Error)]
pub enum StorageError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 라우팅 테이블에 없는 저장 테이블
    #[error("Unknown destination: {0}")]
    UnknownDestination(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 스키마 초기화 오류
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// 연결 풀 소진
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StorageError::PoolExhausted,
            sqlx::Error::Database(db_err) => StorageError::QueryError(db_err.message().to_string()),
            _ => StorageError::QueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

/// 백업 오류. 호출자는 이 오류로 작업을 중단하지 않습니다.
#[derive(Debug, Error)]
pub enum BackupError {
    /// 파일 입출력 오류
    #[error("Backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 스냅샷 직렬화 오류
    #[error("Backup serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 원본 조회 실패
    #[error("Backup source error: {0}")]
    Storage(#[from] StorageError),

    /// 복사본 검증 실패
    #[error("Backup verification failed for {destination}: expected {expected} records, found {found}")]
    Verification {
        destination: String,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, StorageError>;
