//! Geographic policing-intensity analysis.
//!
//! A one-shot batch pipeline: load arrest records and census block-group
//! populations, restrict to the study counties, aggregate discretionary
//! arrest rates per block group, classify block groups into three
//! policing-intensity tiers by population-weighted percentile, compute
//! annualized arrest risks per tier, and emit tables, a chart, and a
//! Markdown report.

pub mod aggregate;
pub mod census;
pub mod config;
pub mod error;
pub mod geo;
pub mod loader;
pub mod models;
pub mod report;
pub mod risk;
pub mod tier;

// Re-export the most common types for easier use
pub use config::{StudyConfig, SubgroupConfig};
pub use error::{Result, StudyError};
pub use models::{
    ArrestRecord, BlockGroupAggregate, CrimeSubsetRisk, DisparityRatios, PopulationRecord,
    SubgroupRisk, Tier, TierRisk, TierStats, TieredBlockGroup,
};

// Pipeline stages
pub use aggregate::aggregate_block_groups;
pub use geo::GeoFilter;
pub use loader::load_arrests;
pub use report::{ChartStyle, ReportInputs, write_artifacts};
pub use risk::RiskReport;
pub use tier::{Classification, CutPoints, classify};
