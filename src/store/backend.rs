use serde::Serialize;

use crate::api::ApiError;
use crate::model::{
    Forestry, ForestryId, Indicator, IndicatorId, Period, RawMeasurement,
    ResponsibilityAssignment, Section,
};

/// Body of a raw value write. The store turns `period` ("YYYY-MM") into the
/// first day of that month and upserts on (forestry, indicator, period).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveRawData {
    pub forestry_id: ForestryId,
    pub indicator_id: IndicatorId,
    pub value: f64,
    pub period: Period,
}

/// The persistence collaborator the rating store loads from and writes to.
///
/// Implemented over HTTP by [`crate::api::ApiClient`]. Futures are not
/// required to be `Send`: a store lives on one task.
#[allow(async_fn_in_trait)]
pub trait RatingBackend {
    async fn fetch_forestries(&self) -> Result<Vec<Forestry>, ApiError>;

    async fn fetch_sections(&self) -> Result<Vec<Section>, ApiError>;

    /// Active indicators only.
    async fn fetch_indicators(&self) -> Result<Vec<Indicator>, ApiError>;

    async fn fetch_raw_data(&self, period: Period) -> Result<Vec<RawMeasurement>, ApiError>;

    async fn fetch_responsibilities(&self) -> Result<Vec<ResponsibilityAssignment>, ApiError>;

    async fn save_raw_data(&self, request: &SaveRawData) -> Result<(), ApiError>;
}
