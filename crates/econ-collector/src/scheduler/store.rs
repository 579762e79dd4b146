//! 스케줄 규칙 파일 저장소.
//!
//! 규칙 집합은 `parameter_name`을 키로 하는 JSON 문서 하나로 저장됩니다.
//! 쓰기는 임시 파일에 기록한 뒤 rename 하므로 중간에 중단되어도 이전 파일이 남습니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use econ_core::ScheduledUpdate;
use tracing::{debug, info};

use crate::SchedulerError;

/// 규칙 집합 (파라미터 이름 → 규칙).
pub type RuleSet = BTreeMap<String, ScheduledUpdate>;

/// JSON 파일 기반 규칙 저장소.
#[derive(Debug, Clone)]
pub struct RuleStore {
    path: PathBuf,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 규칙 집합 로드. 파일이 없으면 빈 집합을 반환합니다.
    pub async fn load(&self) -> Result<RuleSet, SchedulerError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "규칙 파일 없음, 빈 규칙으로 시작");
                return Ok(RuleSet::new());
            }
            Err(e) => return Err(SchedulerError::persistence(&self.path, e)),
        };

        let mut rules: RuleSet = serde_json::from_slice(&bytes)
            .map_err(|e| SchedulerError::persistence(&self.path, e))?;

        // 키와 본문의 파라미터 이름이 다르면 키를 기준으로 맞춤
        for (name, rule) in rules.iter_mut() {
            if rule.parameter_name != *name {
                rule.parameter_name = name.clone();
            }
        }

        debug!(path = %self.path.display(), rules = rules.len(), "규칙 로드");
        Ok(rules)
    }

    /// 규칙 집합 저장 (임시 파일 → rename).
    pub async fn save(&self, rules: &RuleSet) -> Result<(), SchedulerError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SchedulerError::persistence(&self.path, e))?;
        }

        let body = serde_json::to_vec_pretty(rules)
            .map_err(|e| SchedulerError::persistence(&self.path, e))?;

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| SchedulerError::persistence(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SchedulerError::persistence(&self.path, e))?;

        debug!(path = %self.path.display(), rules = rules.len(), "규칙 저장");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
