//! 파라미터 라우팅 테이블.
//!
//! 각 파라미터를 담당 수집기와 저장 테이블에 고정적으로 매핑합니다.
//! 같은 파라미터를 여러 수집기가 지원하더라도 어느 수집기를 쓸지는 이 테이블이 결정하며,
//! 저장 테이블은 파라미터 이름만으로 결정됩니다.

use crate::{Frequency, GeographicScope, ValueRange};

/// 수집기 이름.
pub mod collectors {
    pub const FRED: &str = "FRED";
    pub const ENHANCED_REAL_ESTATE: &str = "Enhanced_RealEstate";
    pub const BLS: &str = "BLS";
    pub const FHFA: &str = "FHFA";
    pub const LENDING: &str = "Lending";
}

/// 저장 테이블 이름.
pub mod destinations {
    pub const INTEREST_RATES: &str = "interest_rates";
    pub const MARKET_DATA: &str = "market_data";
    pub const ECONOMIC_DATA: &str = "economic_data";
    pub const PROPERTY_GROWTH: &str = "property_growth";
    pub const LENDING_REQUIREMENTS: &str = "lending_requirements";

    /// 모든 저장 테이블.
    pub const ALL: [&str; 5] = [
        INTEREST_RATES,
        MARKET_DATA,
        ECONOMIC_DATA,
        PROPERTY_GROWTH,
        LENDING_REQUIREMENTS,
    ];

    /// 알려진 저장 테이블인지 확인.
    pub fn is_known(destination: &str) -> bool {
        ALL.contains(&destination)
    }
}

/// 파라미터 하나의 라우팅 정보.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRoute {
    pub parameter: &'static str,
    pub collector: &'static str,
    pub destination: &'static str,
    pub scope: GeographicScope,
    pub expected_range: ValueRange,
    /// 스케줄 기본 갱신 주기 (변동성 등급)
    pub default_frequency: Frequency,
}

use collectors::*;
use destinations::*;

const fn route(
    parameter: &'static str,
    collector: &'static str,
    destination: &'static str,
    scope: GeographicScope,
    expected_range: ValueRange,
    default_frequency: Frequency,
) -> ParameterRoute {
    ParameterRoute {
        parameter,
        collector,
        destination,
        scope,
        expected_range,
        default_frequency,
    }
}

/// 정적 라우팅 테이블.
///
/// 금리: 주간 / 시장·임대 지표: 월간 / 대출 조건: 분기.
/// 금리는 퍼센트 단위, 나머지는 비율(0.05 = 5%)입니다.
pub const PARAMETER_ROUTES: [ParameterRoute; 11] = [
    route("treasury_10y", FRED, INTEREST_RATES, GeographicScope::National, ValueRange::new(0.0, 20.0), Frequency::Weekly),
    route("fed_funds_rate", FRED, INTEREST_RATES, GeographicScope::National, ValueRange::new(0.0, 20.0), Frequency::Weekly),
    route("commercial_mortgage_rate", FRED, INTEREST_RATES, GeographicScope::National, ValueRange::new(0.0, 25.0), Frequency::Weekly),
    route("cap_rate", ENHANCED_REAL_ESTATE, MARKET_DATA, GeographicScope::Metro, ValueRange::new(0.01, 0.20), Frequency::Monthly),
    route("vacancy_rate", ENHANCED_REAL_ESTATE, MARKET_DATA, GeographicScope::Metro, ValueRange::new(0.0, 0.50), Frequency::Monthly),
    route("rent_growth", BLS, ECONOMIC_DATA, GeographicScope::Metro, ValueRange::new(-0.20, 0.30), Frequency::Monthly),
    route("expense_growth", BLS, ECONOMIC_DATA, GeographicScope::Metro, ValueRange::new(-0.10, 0.30), Frequency::Monthly),
    route("property_growth", FHFA, PROPERTY_GROWTH, GeographicScope::Metro, ValueRange::new(-0.30, 0.40), Frequency::Monthly),
    route("ltv_ratio", LENDING, LENDING_REQUIREMENTS, GeographicScope::National, ValueRange::new(0.40, 0.95), Frequency::Quarterly),
    route("closing_cost_pct", LENDING, LENDING_REQUIREMENTS, GeographicScope::National, ValueRange::new(0.0, 0.10), Frequency::Quarterly),
    route("lender_reserves", LENDING, LENDING_REQUIREMENTS, GeographicScope::National, ValueRange::new(0.0, 0.20), Frequency::Quarterly),
];

/// 파라미터 라우팅 조회.
pub fn route_for(parameter: &str) -> Option<&'static ParameterRoute> {
    PARAMETER_ROUTES.iter().find(|r| r.parameter == parameter)
}

/// 파라미터의 저장 테이블.
pub fn destination_for(parameter: &str) -> Option<&'static str> {
    route_for(parameter).map(|r| r.destination)
}
