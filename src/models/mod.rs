//! Core data structures for the analysis pipeline.
//!
//! Each stage consumes the immutable output of the previous stage and builds
//! a new structure: arrest records and population records in, block-group
//! aggregates, tier assignments, and risk rows out.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single arrest as loaded from the source dataset. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ArrestRecord {
    /// Anonymized defendant identifier
    pub defendant_id: String,
    /// Date of the arrest
    pub arrest_date: NaiveDate,
    /// Geographic identifier of the defendant's address; the first 12
    /// characters form the census block-group code
    pub geoid: String,
    /// Crime category label
    pub crime_category: String,
    /// Defendant age in years, when recorded
    pub age: Option<i32>,
    /// Defendant gender, when recorded
    pub gender: Option<String>,
}

/// Census population reference for one block group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// 12-character block-group GEOID (state + county + tract + block group)
    pub blockgroup_id: String,
    /// Human-readable block-group name from the census
    pub bg_name: String,
    pub total_pop: i64,
    pub male_pop: i64,
    pub female_pop: i64,
    pub white_pop: i64,
    pub black_pop: i64,
    pub hispanic_pop: i64,
    /// Median household income; `None` where the ACS reports a missing-value
    /// sentinel
    pub median_income: Option<f64>,
    pub poverty_count: i64,
    /// Median home value; `None` where the ACS reports a missing-value
    /// sentinel
    pub median_home_value: Option<f64>,
}

/// One block group's joined population and arrest counts with derived rates.
/// Rows only exist for block groups with `total_pop > 0`.
#[derive(Debug, Clone)]
pub struct BlockGroupAggregate {
    pub blockgroup_id: String,
    pub total_pop: i64,
    pub white_pop: i64,
    pub black_pop: i64,
    pub hispanic_pop: i64,
    pub median_income: Option<f64>,
    pub poverty_count: i64,
    /// All arrests attributed to the block group
    pub total_arrests: u64,
    /// Arrests in a discretionary category
    pub discretionary_arrests: u64,
    /// Distinct defendants arrested in the block group
    pub unique_individuals: u64,
    pub total_per_1000: f64,
    pub discretionary_per_1000: f64,
    pub unique_per_1000: f64,
}

/// Policing-intensity tier, ordered from most to least intense
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Ultra,
    Highly,
    Normally,
}

impl Tier {
    /// All tiers, from most to least intense
    pub const ALL: [Self; 3] = [Self::Ultra, Self::Highly, Self::Normally];

    /// Human-readable tier label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ultra => "Ultra-Policed",
            Self::Highly => "Highly Policed",
            Self::Normally => "Normally Policed",
        }
    }

    /// Short label used on chart axes
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Ultra => "Ultra",
            Self::Highly => "Highly",
            Self::Normally => "Normal",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A block-group aggregate with its assigned tier and the cumulative
/// population bookkeeping from the classifier's sorted pass
#[derive(Debug, Clone)]
pub struct TieredBlockGroup {
    pub aggregate: BlockGroupAggregate,
    /// Population of this row and every higher-rate row before it
    pub cumulative_pop: i64,
    /// `cumulative_pop` as a percentage of the joined total
    pub cumulative_pop_pct: f64,
    pub tier: Tier,
}

/// Rollup of every block group within one tier
#[derive(Debug, Clone)]
pub struct TierStats {
    pub tier: Tier,
    pub block_groups: usize,
    pub total_pop: i64,
    pub white_pop: i64,
    pub black_pop: i64,
    pub hispanic_pop: i64,
    pub total_arrests: u64,
    pub discretionary_arrests: u64,
    pub unique_individuals: u64,
    /// Share of the joined population living in this tier
    pub pop_pct: f64,
    pub total_per_1000: f64,
    pub discretionary_per_1000: f64,
    pub unique_per_1000: f64,
}

/// Annualized overall arrest risk for one tier
#[derive(Debug, Clone)]
pub struct TierRisk {
    pub tier: Tier,
    pub population: i64,
    pub unique_individuals: u64,
    /// Probability-like percentage that an average resident was arrested at
    /// least once in a year
    pub annual_risk_pct: f64,
}

/// Annualized arrest risk for the configured demographic subgroup in one tier
#[derive(Debug, Clone)]
pub struct SubgroupRisk {
    pub tier: Tier,
    /// Tier population scaled by the configured subgroup fraction. An
    /// estimate, not a census count.
    pub estimated_population: f64,
    pub unique_individuals: u64,
    pub annual_risk_pct: f64,
}

/// Annualized per-1,000 arrest rate for the crime-subset categories in one
/// tier. Note the different normalization from the percentage risks.
#[derive(Debug, Clone)]
pub struct CrimeSubsetRisk {
    pub tier: Tier,
    pub unique_individuals: u64,
    pub annual_per_1000: f64,
}

/// Ultra-to-Normally risk ratios for the three risk measures
#[derive(Debug, Clone)]
pub struct DisparityRatios {
    pub overall: f64,
    pub subgroup: f64,
    pub crime_subset: f64,
}
