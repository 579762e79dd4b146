//! 수집 시스템 전반에서 사용되는 공통 값 객체.

mod frequency;
mod job;
mod quality;
mod schedule;
mod series;

pub use frequency::*;
pub use job::*;
pub use quality::*;
pub use schedule::*;
pub use series::*;
