//! 내장 수집기 구현.
//!
//! - [`FredCollector`]: 금리 (FRED)
//! - [`FhfaCollector`]: 자산 가치 상승률 (FRED에 게시된 FHFA HPI)
//!
//! 시장 지표(Enhanced_RealEstate), 임대/비용 상승률(BLS), 대출 조건(Lending) 수집기는
//! 외부에서 [`DataCollector`](crate::DataCollector)를 구현해 등록합니다.

pub mod fhfa;
pub mod fred;

pub use fhfa::FhfaCollector;
pub use fred::{FredClient, FredCollector};

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::FredConfig;
use crate::registry::CollectorRegistry;
use crate::Result;

/// 설정에 따라 내장 수집기를 등록하고 등록된 수를 반환합니다.
///
/// FRED API 키가 없으면 아무것도 등록하지 않습니다.
pub fn register_builtin_collectors(
    registry: &CollectorRegistry,
    config: &FredConfig,
) -> Result<usize> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        warn!("FRED API 키 없음, FRED/FHFA 수집기 등록 생략");
        return Ok(0);
    };

    let client = Arc::new(FredClient::new(
        api_key,
        config.base_url.as_str(),
        config.request_delay(),
    )?);
    registry.register(Arc::new(FredCollector::new(Arc::clone(&client))));
    registry.register(Arc::new(FhfaCollector::new(client)));

    info!(collectors = 2, "내장 수집기 등록 완료");
    Ok(2)
}
