//! 수집 데이터 저장 및 백업.
//!
//! 이 crate는 다음을 제공합니다:
//! - 저장 테이블 단위 upsert/조회 추상화 (`DataStorage`)
//! - 인메모리 저장소 (테스트, DB 없는 실행)
//! - PostgreSQL 저장소 (자연키 기준 `ON CONFLICT` upsert)
//! - 전체 저장소 스냅샷 백업 (복사 + 검증)

pub mod backup;
pub mod error;
pub mod storage;

pub use backup::{BackupService, SnapshotBackup};
pub use error::{BackupError, Result, StorageError};
pub use storage::memory::MemoryStorage;
pub use storage::postgres::{DatabaseConfig, PgStorage};
pub use storage::{DataStorage, RecordFilter};
