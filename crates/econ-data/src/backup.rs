//! 저장소 백업.
//!
//! 전체 갱신처럼 모든 저장 테이블을 덮어쓰는 작업 전에 스냅샷을 남깁니다.
//! 백업 실패는 호출자가 로그만 남기고 진행합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use econ_core::{destinations, DataPoint};
use tracing::{debug, info};

use crate::storage::{DataStorage, RecordFilter};
use crate::BackupError;

/// 백업 서비스 인터페이스.
#[async_trait]
pub trait BackupService: Send + Sync {
    /// 모든 저장 테이블을 백업하고 생성된 파일 목록을 반환합니다.
    async fn backup_all(&self) -> Result<Vec<PathBuf>, BackupError>;
}

/// 저장 테이블별 JSON 스냅샷 백업.
///
/// `{backup_dir}/{YYYYmmdd_HHMMSS}/{destination}.json`에 기록한 뒤
/// 다시 읽어 레코드 수가 일치하는지 검증합니다.
pub struct SnapshotBackup {
    storage: Arc<dyn DataStorage>,
    backup_dir: PathBuf,
}

impl SnapshotBackup {
    pub fn new(storage: Arc<dyn DataStorage>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    async fn snapshot_destination(
        &self,
        dir: &Path,
        destination: &str,
    ) -> Result<PathBuf, BackupError> {
        let records = self.storage.query(destination, &RecordFilter::all()).await?;
        let path = dir.join(format!("{}.json", destination));

        let body = serde_json::to_vec_pretty(&records)?;
        tokio::fs::write(&path, body).await?;

        // 검증: 다시 읽어서 레코드 수 비교
        let written = tokio::fs::read(&path).await?;
        let restored: Vec<DataPoint> = serde_json::from_slice(&written)?;
        if restored.len() != records.len() {
            return Err(BackupError::Verification {
                destination: destination.to_string(),
                expected: records.len(),
                found: restored.len(),
            });
        }

        debug!(destination, records = records.len(), path = %path.display(), "테이블 백업 완료");
        Ok(path)
    }
}

#[async_trait]
impl BackupService for SnapshotBackup {
    async fn backup_all(&self) -> Result<Vec<PathBuf>, BackupError> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let dir = self.backup_dir.join(stamp);
        tokio::fs::create_dir_all(&dir).await?;

        let mut artifacts = Vec::with_capacity(destinations::ALL.len());
        for destination in destinations::ALL {
            artifacts.push(self.snapshot_destination(&dir, destination).await?);
        }

        info!(
            storage = self.storage.name(),
            files = artifacts.len(),
            dir = %dir.display(),
            "저장소 백업 완료"
        );
        Ok(artifacts)
    }
}
