pub mod period;
pub mod types;

pub use period::{Period, PeriodParseError};
pub use types::{
    Actor, Forestry, ForestryId, Indicator, IndicatorId, IndicatorKind, RawMeasurement,
    ResponsibilityAssignment, Role, Section, SectionId, UserId,
};
