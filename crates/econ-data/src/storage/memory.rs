//! 인메모리 저장소.
//!
//! DB 없이 실행하거나 테스트할 때 사용합니다. 프로세스 종료 시 데이터는 사라집니다.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use econ_core::{destinations, DataPoint};
use tokio::sync::RwLock;
use tracing::debug;

use super::{DataStorage, RecordFilter};
use crate::{Result, StorageError};

type NaturalKey = (String, String, NaiveDate);

/// 저장 테이블별 BTreeMap으로 자연키 정렬을 유지하는 저장소.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, BTreeMap<NaturalKey, DataPoint>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장 테이블의 전체 레코드 수.
    pub async fn table_len(&self, destination: &str) -> usize {
        self.tables
            .read()
            .await
            .get(destination)
            .map_or(0, BTreeMap::len)
    }
}

fn ensure_known(destination: &str) -> Result<()> {
    if destinations::is_known(destination) {
        Ok(())
    } else {
        Err(StorageError::UnknownDestination(destination.to_string()))
    }
}

#[async_trait]
impl DataStorage for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, destination: &str, records: &[DataPoint]) -> Result<usize> {
        ensure_known(destination)?;

        let mut tables = self.tables.write().await;
        let table = tables.entry(destination.to_string()).or_default();
        for record in records {
            table.insert(record.natural_key(), record.clone());
        }

        debug!(destination, count = records.len(), "인메모리 upsert 완료");
        Ok(records.len())
    }

    async fn query(&self, destination: &str, filter: &RecordFilter) -> Result<Vec<DataPoint>> {
        ensure_known(destination)?;

        let tables = self.tables.read().await;
        Ok(tables
            .get(destination)
            .map(|table| {
                table
                    .values()
                    .filter(|p| filter.matches(p))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use econ_core::NATIONAL;

    fn point(day: u32, value: f64) -> DataPoint {
        DataPoint::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            Some(value),
            "treasury_10y",
            NATIONAL,
            "FRED",
        )
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let storage = MemoryStorage::new();
        let records = vec![point(2, 3.9), point(3, 4.0)];

        storage.upsert("interest_rates", &records).await.unwrap();
        storage.upsert("interest_rates", &records).await.unwrap();

        assert_eq!(storage.table_len("interest_rates").await, 2);
    }

    #[tokio::test]
    async fn test_upsert_replaces_value() {
        let storage = MemoryStorage::new();
        storage
            .upsert("interest_rates", &[point(2, 3.9)])
            .await
            .unwrap();
        storage
            .upsert("interest_rates", &[point(2, 4.5)])
            .await
            .unwrap();

        let records = storage
            .query("interest_rates", &RecordFilter::all())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, Some(4.5));
    }

    #[tokio::test]
    async fn test_latest_date_and_count() {
        let storage = MemoryStorage::new();
        storage
            .upsert("interest_rates", &[point(5, 4.0), point(2, 3.9), point(9, 4.1)])
            .await
            .unwrap();

        let filter = RecordFilter::parameter("treasury_10y");
        assert_eq!(
            storage.latest_date("interest_rates", &filter).await.unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 9)
        );
        assert_eq!(storage.count("interest_rates", &filter).await.unwrap(), 3);
        assert_eq!(
            storage
                .latest_date("interest_rates", &RecordFilter::parameter("fed_funds_rate"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_unknown_destination_rejected() {
        let storage = MemoryStorage::new();
        let err = storage.upsert("klines", &[point(2, 1.0)]).await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownDestination(_)));
    }
}
