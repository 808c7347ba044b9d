pub mod backend;
pub mod rating;

pub use backend::{RatingBackend, SaveRawData};
pub use rating::{IndicatorScore, RankedForestry, RatingData, RatingStore};

use thiserror::Error;

use crate::api::ApiError;
use crate::model::{ForestryId, IndicatorId, Period};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to load rating data for {period}")]
    Load {
        period: Period,
        #[source]
        source: ApiError,
    },
    #[error("failed to save value for forestry {forestry}, indicator {indicator}, period {period}")]
    Save {
        forestry: ForestryId,
        indicator: IndicatorId,
        period: Period,
        #[source]
        source: ApiError,
    },
}

impl StoreError {
    /// The backend error behind this failure.
    pub fn api_error(&self) -> &ApiError {
        match self {
            StoreError::Load { source, .. } | StoreError::Save { source, .. } => source,
        }
    }
}
