use chrono::Utc;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, trace, warn};

use super::backend::{RatingBackend, SaveRawData};
use super::StoreError;
use crate::model::{
    Actor, Forestry, ForestryId, Indicator, IndicatorId, Period, RawMeasurement,
    ResponsibilityAssignment, Role, Section, SectionId,
};
use crate::scoring::{
    calculate_score, validate_catalog, CacheStats, ScoreCache, ScoreClass, ScoreKey,
    ScoringConfig,
};

/// Everything a bulk load brings in.
#[derive(Debug, Clone, Default)]
pub struct RatingData {
    pub forestries: Vec<Forestry>,
    pub sections: Vec<Section>,
    pub indicators: Vec<Indicator>,
    pub raw_data: Vec<RawMeasurement>,
    pub responsibilities: Vec<ResponsibilityAssignment>,
}

/// A forestry with its total for one period.
#[derive(Debug, Clone)]
pub struct RankedForestry<'a> {
    pub forestry: &'a Forestry,
    pub total: f64,
}

/// One row of a forestry's per-indicator breakdown.
#[derive(Debug, Clone)]
pub struct IndicatorScore<'a> {
    pub section: Option<&'a Section>,
    pub indicator: &'a Indicator,
    pub value: f64,
    pub score: f64,
    pub class: ScoreClass,
}

/// In-memory rating data for one session, with memoized scores.
///
/// Reads never suspend. Only `load_all_data` and `save_value` talk to the
/// backend, and both touch local state only after the backend succeeded.
#[derive(Debug)]
pub struct RatingStore {
    scoring: ScoringConfig,
    actor: Option<Actor>,
    period: Period,
    forestries: Vec<Forestry>,
    sections: Vec<Section>,
    // ordered by section sort_order, section id, indicator id
    indicators: Vec<Indicator>,
    raw_data: Vec<RawMeasurement>,
    responsibilities: Vec<ResponsibilityAssignment>,
    cache: RefCell<ScoreCache>,
}

impl RatingStore {
    pub fn new(scoring: ScoringConfig, period: Period) -> Self {
        Self {
            scoring,
            actor: None,
            period,
            forestries: Vec::new(),
            sections: Vec::new(),
            indicators: Vec::new(),
            raw_data: Vec::new(),
            responsibilities: Vec::new(),
            cache: RefCell::new(ScoreCache::new()),
        }
    }

    pub fn set_actor(&mut self, actor: Option<Actor>) {
        self.actor = actor;
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }

    /// The period the raw data was last loaded for.
    pub fn period(&self) -> Period {
        self.period
    }

    pub fn forestries(&self) -> &[Forestry] {
        &self.forestries
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Every known indicator, active or not, in display order.
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn raw_data(&self) -> &[RawMeasurement] {
        &self.raw_data
    }

    pub fn forestry(&self, id: ForestryId) -> Option<&Forestry> {
        self.forestries.iter().find(|f| f.id == id)
    }

    pub fn indicator(&self, id: IndicatorId) -> Option<&Indicator> {
        self.indicators.iter().find(|i| i.id == id)
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Active indicators in display order. Totals are summed in this order.
    pub fn active_indicators(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.iter().filter(|i| i.is_active)
    }

    pub fn indicators_by_section(&self, section: SectionId) -> Vec<&Indicator> {
        self.active_indicators()
            .filter(|i| i.section_id == section)
            .collect()
    }

    /// Fetch every collection for `period` and replace local state.
    ///
    /// On error nothing local changes.
    pub async fn load_all_data<B: RatingBackend>(
        &mut self,
        backend: &B,
        period: Period,
    ) -> Result<(), StoreError> {
        let (forestries, sections, indicators, raw_data, responsibilities) = tokio::try_join!(
            backend.fetch_forestries(),
            backend.fetch_sections(),
            backend.fetch_indicators(),
            backend.fetch_raw_data(period),
            backend.fetch_responsibilities(),
        )
        .map_err(|source| StoreError::Load { period, source })?;

        self.replace_data(
            RatingData {
                forestries,
                sections,
                indicators,
                raw_data,
                responsibilities,
            },
            period,
        );
        Ok(())
    }

    /// Replace all collections wholesale and drop every cached score.
    pub fn replace_data(&mut self, data: RatingData, period: Period) {
        if let Err(errors) = validate_catalog(&data.indicators, &data.sections) {
            for error in errors {
                warn!("catalog: {}", error);
            }
        }

        self.forestries = data.forestries;
        self.sections = data.sections;
        self.indicators = data.indicators;
        self.raw_data = data.raw_data;
        self.responsibilities = data.responsibilities;
        self.period = period;
        self.order_indicators();
        self.clear_cache();

        info!(
            period = %period,
            forestries = self.forestries.len(),
            indicators = self.indicators.len(),
            measurements = self.raw_data.len(),
            "rating data loaded"
        );
    }

    fn order_indicators(&mut self) {
        let section_order: HashMap<SectionId, i64> =
            self.sections.iter().map(|s| (s.id, s.sort_order)).collect();
        self.indicators.sort_by_key(|i| {
            (
                section_order.get(&i.section_id).copied().unwrap_or(i64::MAX),
                i.section_id,
                i.id,
            )
        });
    }

    /// Raw value for a cell; 0 when nothing was recorded.
    pub fn get_value(&self, forestry: ForestryId, indicator: IndicatorId, period: Period) -> f64 {
        self.measurement(forestry, indicator, period)
            .map(|r| r.value)
            .unwrap_or(0.0)
    }

    fn measurement(
        &self,
        forestry: ForestryId,
        indicator: IndicatorId,
        period: Period,
    ) -> Option<&RawMeasurement> {
        self.raw_data.iter().find(|r| {
            r.forestry_id == forestry && r.indicator_id == indicator && r.period == period
        })
    }

    /// Peer group: every recorded value of `indicator` within `period`.
    fn peer_values(&self, indicator: IndicatorId, period: Period) -> impl Iterator<Item = f64> + '_ {
        self.raw_data
            .iter()
            .filter(move |r| r.indicator_id == indicator && r.period == period)
            .map(|r| r.value)
    }

    /// Memoized score for one cell.
    pub fn get_score(&self, forestry: ForestryId, indicator: IndicatorId, period: Period) -> f64 {
        let key = ScoreKey::new(forestry, indicator, period);
        self.cache
            .borrow_mut()
            .get_or_compute(key, || self.compute_score(forestry, indicator, period))
    }

    fn compute_score(&self, forestry: ForestryId, indicator: IndicatorId, period: Period) -> f64 {
        let value = self.get_value(forestry, indicator, period);
        let score = calculate_score(
            value,
            self.indicator(indicator),
            self.peer_values(indicator, period),
            self.scoring.rounding,
        );
        trace!(forestry, indicator, period = %period, value, score, "score computed");
        score
    }

    /// Sum of active indicator scores, rounded like the scores themselves.
    pub fn total_score(&self, forestry: ForestryId, period: Period) -> f64 {
        let total: f64 = self
            .active_indicators()
            .map(|i| self.get_score(forestry, i.id, period))
            .sum();
        self.scoring.rounding.apply(total)
    }

    /// Total formatted with two decimals, e.g. "10.00".
    pub fn get_total_score(&self, forestry: ForestryId, period: Period) -> String {
        format!("{:.2}", self.total_score(forestry, period))
    }

    pub fn get_score_class(&self, score: f64) -> ScoreClass {
        ScoreClass::of(score)
    }

    /// Forestries by total descending; ties go to the lower id.
    pub fn ranking(&self, period: Period) -> Vec<RankedForestry<'_>> {
        let mut ranked: Vec<_> = self
            .forestries
            .iter()
            .map(|forestry| RankedForestry {
                forestry,
                total: self.total_score(forestry.id, period),
            })
            .collect();

        ranked.sort_by(|a, b| {
            let cmp = b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal);
            if cmp != Ordering::Equal {
                return cmp;
            }
            a.forestry.id.cmp(&b.forestry.id)
        });
        ranked
    }

    /// Per-indicator rows for one forestry, in display order.
    pub fn breakdown(&self, forestry: ForestryId, period: Period) -> Vec<IndicatorScore<'_>> {
        self.active_indicators()
            .map(|indicator| self.score_row(forestry, indicator, period))
            .collect()
    }

    /// Like `breakdown`, limited to one section.
    pub fn section_breakdown(
        &self,
        forestry: ForestryId,
        section: SectionId,
        period: Period,
    ) -> Vec<IndicatorScore<'_>> {
        self.indicators_by_section(section)
            .into_iter()
            .map(|indicator| self.score_row(forestry, indicator, period))
            .collect()
    }

    fn score_row<'a>(
        &'a self,
        forestry: ForestryId,
        indicator: &'a Indicator,
        period: Period,
    ) -> IndicatorScore<'a> {
        let score = self.get_score(forestry, indicator.id, period);
        IndicatorScore {
            section: self.section(indicator.section_id),
            indicator,
            value: self.get_value(forestry, indicator.id, period),
            score,
            class: ScoreClass::of(score),
        }
    }

    /// Whether the current actor may submit values for `indicator`.
    ///
    /// Admins may edit anything, engineers only what they are assigned to.
    /// No actor, or any other role, means read-only.
    pub fn can_edit_indicator(&self, indicator: IndicatorId) -> bool {
        let Some(actor) = &self.actor else {
            return false;
        };
        match actor.role {
            Role::Admin => true,
            Role::Engineer => self
                .responsibilities
                .iter()
                .any(|r| r.indicator_id == indicator && r.user_id == actor.id),
            Role::Viewer => false,
        }
    }

    pub fn editable_indicators(&self) -> Vec<&Indicator> {
        self.active_indicators()
            .filter(|i| self.can_edit_indicator(i.id))
            .collect()
    }

    /// Write a raw value through the backend, then mirror it locally.
    ///
    /// The local upsert and cache invalidation only happen after the backend
    /// accepted the write. Failed writes are not retried.
    pub async fn save_value<B: RatingBackend>(
        &mut self,
        backend: &B,
        forestry: ForestryId,
        indicator: IndicatorId,
        value: f64,
        period: Period,
    ) -> Result<(), StoreError> {
        let request = SaveRawData {
            forestry_id: forestry,
            indicator_id: indicator,
            value,
            period,
        };
        backend
            .save_raw_data(&request)
            .await
            .map_err(|source| StoreError::Save {
                forestry,
                indicator,
                period,
                source,
            })?;

        self.upsert_measurement(forestry, indicator, value, period);
        let dropped = self
            .cache
            .get_mut()
            .invalidate_indicator_period(indicator, period);
        debug!(forestry, indicator, period = %period, value, dropped, "value saved");
        Ok(())
    }

    fn upsert_measurement(
        &mut self,
        forestry: ForestryId,
        indicator: IndicatorId,
        value: f64,
        period: Period,
    ) {
        let now = Utc::now();
        if let Some(existing) = self.raw_data.iter_mut().find(|r| {
            r.forestry_id == forestry && r.indicator_id == indicator && r.period == period
        }) {
            existing.value = value;
            existing.updated_at = Some(now);
        } else {
            // id is assigned by the store; the next load picks it up
            self.raw_data.push(RawMeasurement {
                id: None,
                forestry_id: forestry,
                indicator_id: indicator,
                value,
                period,
                created_by: self.actor.as_ref().map(|a| a.id),
                updated_at: Some(now),
            });
        }
    }

    /// Apply a catalog edit (weight, kind, activation) to the local copy.
    /// Scores of that indicator are dropped for every period.
    pub fn upsert_indicator(&mut self, indicator: Indicator) {
        let id = indicator.id;
        match self.indicators.iter_mut().find(|i| i.id == id) {
            Some(existing) => *existing = indicator,
            None => self.indicators.push(indicator),
        }
        self.order_indicators();
        self.invalidate(id);
    }

    /// Drop every cached score of `indicator`, across forestries and periods.
    pub fn invalidate(&self, indicator: IndicatorId) {
        let dropped = self.cache.borrow_mut().invalidate_indicator(indicator);
        debug!(indicator, dropped, "indicator scores invalidated");
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    pub fn cached_scores(&self) -> usize {
        self.cache.borrow().len()
    }
}
