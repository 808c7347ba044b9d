//! Forestry rating: score forestries against weighted indicators for a month.
//!
//! Raw values are normalized against the best forestry of the same period
//! (`normal` indicators), or taken as signed points (`penalty`, `bonus`).
//! [`store::RatingStore`] holds one session's data and memoizes scores,
//! dropping exactly the affected entries when a value is saved.

pub mod api;
pub mod config;
pub mod credentials;
pub mod model;
pub mod output;
pub mod scoring;
pub mod session;
pub mod store;
