//! 수집기 레지스트리.
//!
//! 이름으로 수집기 인스턴스를 보관합니다. 전역 상태가 아니라 명시적으로 생성해서
//! 오케스트레이터에 주입합니다. 지원 범위 중복 검증은 하지 않으며, 라우팅의 정확성은
//! 오케스트레이터의 라우팅 테이블이 책임집니다.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::collector::{CollectorCapabilities, DataCollector};

/// 이름 → 수집기 맵.
#[derive(Default)]
pub struct CollectorRegistry {
    collectors: RwLock<BTreeMap<String, Arc<dyn DataCollector>>>,
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field("collectors", &self.names())
            .finish()
    }
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 수집기 등록. 같은 이름이 있으면 교체하고 이전 인스턴스를 반환합니다.
    pub fn register(&self, collector: Arc<dyn DataCollector>) -> Option<Arc<dyn DataCollector>> {
        let name = collector.name().to_string();
        let previous = self
            .collectors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), collector);

        info!(
            collector = %name,
            replaced = previous.is_some(),
            "수집기 등록"
        );
        previous
    }

    /// 수집기 등록 해제.
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn DataCollector>> {
        self.collectors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// 이름으로 조회.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DataCollector>> {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// 파라미터를 지원한다고 선언한 수집기 목록 (없으면 빈 목록).
    pub fn collectors_for(&self, parameter: &str) -> Vec<Arc<dyn DataCollector>> {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|c| c.serves(parameter))
            .cloned()
            .collect()
    }

    /// 등록된 수집기 이름 (정렬됨).
    pub fn names(&self) -> Vec<String> {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// 등록된 수집기의 지원 범위.
    pub fn capabilities(&self) -> Vec<CollectorCapabilities> {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|c| c.capabilities())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use econ_core::DataPoint;

    struct NamedCollector {
        name: &'static str,
        params: Vec<&'static str>,
        tag: u32,
    }

    #[async_trait]
    impl DataCollector for NamedCollector {
        fn name(&self) -> &str {
            self.name
        }

        fn available_parameters(&self) -> Vec<&str> {
            self.params.clone()
        }

        fn supported_geographies(&self) -> Vec<&str> {
            Vec::new()
        }

        async fn collect_data(
            &self,
            _parameter: &str,
            _geography: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> crate::Result<Vec<DataPoint>> {
            Ok(Vec::new())
        }
    }

    fn collector(name: &'static str, params: Vec<&'static str>, tag: u32) -> Arc<NamedCollector> {
        Arc::new(NamedCollector { name, params, tag })
    }

    #[test]
    fn test_register_last_wins() {
        let registry = CollectorRegistry::new();
        assert!(registry.register(collector("FRED", vec!["treasury_10y"], 1)).is_none());
        assert!(registry.register(collector("FRED", vec!["treasury_10y"], 2)).is_some());

        assert_eq!(registry.len(), 1);
        let current = registry.get("FRED").unwrap();
        assert_eq!(current.name(), "FRED");
        assert_eq!(registry.names(), vec!["FRED".to_string()]);
    }

    #[test]
    fn test_replaced_instance_returned() {
        let registry = CollectorRegistry::new();
        let first = collector("FHFA", vec!["property_growth"], 7);
        registry.register(first.clone());

        let previous = registry
            .register(collector("FHFA", vec!["property_growth"], 8))
            .unwrap();
        assert!(Arc::ptr_eq(
            &previous,
            &(first.clone() as Arc<dyn DataCollector>)
        ));
        assert_eq!(first.tag, 7);
    }

    #[test]
    fn test_collectors_for_parameter() {
        let registry = CollectorRegistry::new();
        registry.register(collector("FRED", vec!["treasury_10y", "fed_funds_rate"], 1));
        registry.register(collector("Backup_Rates", vec!["treasury_10y"], 1));
        registry.register(collector("FHFA", vec!["property_growth"], 1));

        assert_eq!(registry.collectors_for("treasury_10y").len(), 2);
        assert_eq!(registry.collectors_for("property_growth").len(), 1);
        assert!(registry.collectors_for("cap_rate").is_empty());
    }

    #[test]
    fn test_unregister() {
        let registry = CollectorRegistry::new();
        registry.register(collector("FRED", vec!["treasury_10y"], 1));
        assert!(registry.unregister("FRED").is_some());
        assert!(registry.is_empty());
        assert!(!registry.contains("FRED"));
    }
}
