//! Annualized arrest-risk computation.
//!
//! Three measures per tier, all pure functions of the tier rollups, the
//! per-tier unique-defendant counts, and the elapsed-years scalar:
//!
//! * overall annual risk, as a percentage of tier population;
//! * subgroup annual risk, as a percentage of an *estimated* subgroup
//!   population (tier population times a configured fraction);
//! * crime-subset annual rate, per 1,000 tier residents — deliberately a
//!   different normalization, kept explicit in the type names.
//!
//! The elapsed-years denominator spans the full unfiltered dataset's date
//! range: the study period is the data collection period, regardless of the
//! geographic filter. The report states the range used.

use chrono::NaiveDate;
use itertools::Itertools;
use itertools::MinMaxResult;
use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::models::{
    ArrestRecord, CrimeSubsetRisk, DisparityRatios, SubgroupRisk, Tier, TierRisk, TierStats,
};
use crate::tier::Classification;

/// Days per year including leap years
const DAYS_PER_YEAR: f64 = 365.25;

/// Minimum and maximum arrest date across a dataset
pub fn date_range(arrests: &[ArrestRecord]) -> Result<(NaiveDate, NaiveDate)> {
    match arrests.iter().map(|a| a.arrest_date).minmax() {
        MinMaxResult::NoElements => Err(StudyError::EmptyDataset),
        MinMaxResult::OneElement(date) => Ok((date, date)),
        MinMaxResult::MinMax(min, max) => Ok((min, max)),
    }
}

/// Elapsed study period in fractional years
pub fn elapsed_years(min: NaiveDate, max: NaiveDate) -> Result<f64> {
    let days = (max - min).num_days();
    if days <= 0 {
        return Err(StudyError::ZeroDateSpan);
    }
    Ok(days as f64 / DAYS_PER_YEAR)
}

/// Map from block-group code to assigned tier
fn tier_lookup(classification: &Classification) -> FxHashMap<&str, Tier> {
    classification
        .rows
        .iter()
        .map(|row| (row.aggregate.blockgroup_id.as_str(), row.tier))
        .collect()
}

/// Count distinct defendants per tier among arrests passing `keep`.
/// Arrests in block groups that did not survive the census join carry no
/// tier and are skipped.
fn unique_defendants_per_tier<'a, F>(
    arrests: &'a [ArrestRecord],
    tiers: &FxHashMap<&str, Tier>,
    keep: F,
) -> FxHashMap<Tier, u64>
where
    F: Fn(&ArrestRecord) -> bool,
{
    let mut seen: FxHashMap<Tier, FxHashSet<&'a str>> = FxHashMap::default();
    for record in arrests {
        if !keep(record) {
            continue;
        }
        // Records here already passed the geographic filter, so extraction
        // cannot fail; unmatched block groups simply carry no tier.
        let Some(bg) = record.geoid.get(..crate::geo::BLOCK_GROUP_ID_LEN) else {
            continue;
        };
        if let Some(&tier) = tiers.get(bg) {
            seen.entry(tier).or_default().insert(record.defendant_id.as_str());
        }
    }
    seen.into_iter().map(|(t, ids)| (t, ids.len() as u64)).collect()
}

fn overall_risks(stats: &[TierStats], years: f64) -> Vec<TierRisk> {
    stats
        .iter()
        .map(|s| {
            let annual_risk_pct = if s.total_pop > 0 {
                (s.unique_individuals as f64 / years) / s.total_pop as f64 * 100.0
            } else {
                0.0
            };
            TierRisk {
                tier: s.tier,
                population: s.total_pop,
                unique_individuals: s.unique_individuals,
                annual_risk_pct,
            }
        })
        .collect()
}

fn subgroup_risks(
    stats: &[TierStats],
    counts: &FxHashMap<Tier, u64>,
    years: f64,
    fraction: f64,
) -> Vec<SubgroupRisk> {
    stats
        .iter()
        .map(|s| {
            let unique = counts.get(&s.tier).copied().unwrap_or(0);
            let estimated_population = s.total_pop as f64 * fraction;
            let annual_risk_pct = if estimated_population > 0.0 {
                (unique as f64 / years) / estimated_population * 100.0
            } else {
                0.0
            };
            SubgroupRisk {
                tier: s.tier,
                estimated_population,
                unique_individuals: unique,
                annual_risk_pct,
            }
        })
        .collect()
}

fn crime_subset_risks(
    stats: &[TierStats],
    counts: &FxHashMap<Tier, u64>,
    years: f64,
) -> Vec<CrimeSubsetRisk> {
    stats
        .iter()
        .map(|s| {
            let unique = counts.get(&s.tier).copied().unwrap_or(0);
            let annual_per_1000 = if s.total_pop > 0 {
                (unique as f64 / years) / s.total_pop as f64 * 1000.0
            } else {
                0.0
            };
            CrimeSubsetRisk {
                tier: s.tier,
                unique_individuals: unique,
                annual_per_1000,
            }
        })
        .collect()
}

/// Ultra-to-Normally ratio; zero denominator is an error, never inf or NaN
fn disparity(measure: &str, ultra: f64, normally: f64) -> Result<f64> {
    if normally == 0.0 {
        return Err(StudyError::DivisionByZeroRisk {
            measure: measure.to_string(),
            tier: Tier::Normally.label().to_string(),
        });
    }
    Ok(ultra / normally)
}

fn risk_of(risks: &[TierRisk], tier: Tier) -> f64 {
    risks
        .iter()
        .find(|r| r.tier == tier)
        .map_or(0.0, |r| r.annual_risk_pct)
}

/// Everything the reporter needs about annual risks
#[derive(Debug, Clone)]
pub struct RiskReport {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub elapsed_years: f64,
    pub overall: Vec<TierRisk>,
    pub subgroup: Vec<SubgroupRisk>,
    pub crime_subset: Vec<CrimeSubsetRisk>,
    pub ratios: DisparityRatios,
}

impl RiskReport {
    /// Compute all per-tier risks and the Ultra/Normally disparity ratios.
    ///
    /// `full_date_range` comes from the dataset before geographic filtering;
    /// `arrests` is the geographically filtered set used for subgroup and
    /// crime-subset counts.
    pub fn compute(
        arrests: &[ArrestRecord],
        full_date_range: (NaiveDate, NaiveDate),
        classification: &Classification,
        config: &StudyConfig,
    ) -> Result<Self> {
        let (min_date, max_date) = full_date_range;
        let years = elapsed_years(min_date, max_date)?;
        info!(
            "Annualizing over {:.1} years of data ({} to {})",
            years, min_date, max_date
        );

        let tiers = tier_lookup(classification);
        let stats = &classification.stats;

        let overall = overall_risks(stats, years);

        let subgroup_cfg = &config.subgroup;
        let subgroup_counts = unique_defendants_per_tier(arrests, &tiers, |r| {
            r.age
                .is_some_and(|age| age >= subgroup_cfg.min_age && age <= subgroup_cfg.max_age)
                && r.gender.as_deref() == Some(subgroup_cfg.gender.as_str())
        });
        let subgroup = subgroup_risks(stats, &subgroup_counts, years, subgroup_cfg.population_fraction);

        let subset_counts = unique_defendants_per_tier(arrests, &tiers, |r| {
            r.crime_category.contains(&config.crime_keyword)
        });
        let crime_subset = crime_subset_risks(stats, &subset_counts, years);

        let ratios = DisparityRatios {
            overall: disparity(
                "overall annual risk",
                risk_of(&overall, Tier::Ultra),
                risk_of(&overall, Tier::Normally),
            )?,
            subgroup: disparity(
                "subgroup annual risk",
                subgroup
                    .iter()
                    .find(|r| r.tier == Tier::Ultra)
                    .map_or(0.0, |r| r.annual_risk_pct),
                subgroup
                    .iter()
                    .find(|r| r.tier == Tier::Normally)
                    .map_or(0.0, |r| r.annual_risk_pct),
            )?,
            crime_subset: disparity(
                "crime-subset annual rate",
                crime_subset
                    .iter()
                    .find(|r| r.tier == Tier::Ultra)
                    .map_or(0.0, |r| r.annual_per_1000),
                crime_subset
                    .iter()
                    .find(|r| r.tier == Tier::Normally)
                    .map_or(0.0, |r| r.annual_per_1000),
            )?,
        };

        info!(
            "Disparities: overall {:.1}x, subgroup {:.1}x, crime subset {:.1}x",
            ratios.overall, ratios.subgroup, ratios.crime_subset
        );

        Ok(Self {
            min_date,
            max_date,
            elapsed_years: years,
            overall,
            subgroup,
            crime_subset,
            ratios,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(tier: Tier, total_pop: i64, unique_individuals: u64) -> TierStats {
        TierStats {
            tier,
            block_groups: 1,
            total_pop,
            white_pop: 0,
            black_pop: 0,
            hispanic_pop: 0,
            total_arrests: unique_individuals,
            discretionary_arrests: unique_individuals,
            unique_individuals,
            pop_pct: 0.0,
            total_per_1000: 0.0,
            discretionary_per_1000: 0.0,
            unique_per_1000: 0.0,
        }
    }

    #[test]
    fn elapsed_years_uses_julian_year() {
        let min = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let max = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let years = elapsed_years(min, max).unwrap();
        // 3652 days: two leap years in the span
        assert!((years - 3652.0 / 365.25).abs() < 1e-12);
    }

    #[test]
    fn zero_date_span_is_an_error() {
        let day = NaiveDate::from_ymd_opt(2015, 6, 1).unwrap();
        assert!(matches!(
            elapsed_years(day, day),
            Err(StudyError::ZeroDateSpan)
        ));
    }

    #[test]
    fn overall_risk_formula() {
        // 500 unique individuals over 5 years in a tier of 10,000 people:
        // 100 per year / 10,000 = 1% annual risk
        let rows = overall_risks(&[stats(Tier::Ultra, 10_000, 500)], 5.0);
        assert!((rows[0].annual_risk_pct - 1.0).abs() < 1e-12);
    }

    #[test]
    fn subgroup_risk_uses_estimated_population() {
        let mut counts = FxHashMap::default();
        counts.insert(Tier::Ultra, 100u64);
        // Estimated subgroup population = 10,000 * 0.20 = 2,000;
        // 100 unique over 5 years = 20/year; 20 / 2,000 = 1%
        let rows = subgroup_risks(&[stats(Tier::Ultra, 10_000, 500)], &counts, 5.0, 0.20);
        assert!((rows[0].estimated_population - 2000.0).abs() < 1e-12);
        assert!((rows[0].annual_risk_pct - 1.0).abs() < 1e-12);
    }

    #[test]
    fn crime_subset_rate_is_per_1000() {
        let mut counts = FxHashMap::default();
        counts.insert(Tier::Ultra, 50u64);
        // 50 unique over 5 years = 10/year; 10 / 10,000 * 1000 = 1 per 1,000
        let rows = crime_subset_risks(&[stats(Tier::Ultra, 10_000, 500)], &counts, 5.0);
        assert!((rows[0].annual_per_1000 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_risk_is_an_error() {
        assert!(matches!(
            disparity("overall annual risk", 2.5, 0.0),
            Err(StudyError::DivisionByZeroRisk { .. })
        ));
        assert!((disparity("overall annual risk", 2.5, 0.5).unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn disparity_is_scale_invariant() {
        // Multiplying every population by k leaves the ratio unchanged
        let base = overall_risks(
            &[stats(Tier::Ultra, 1_000, 100), stats(Tier::Normally, 10_000, 100)],
            5.0,
        );
        let scaled = overall_risks(
            &[stats(Tier::Ultra, 7_000, 100), stats(Tier::Normally, 70_000, 100)],
            5.0,
        );
        let ratio = |rows: &[TierRisk]| {
            disparity(
                "overall annual risk",
                risk_of(rows, Tier::Ultra),
                risk_of(rows, Tier::Normally),
            )
            .unwrap()
        };
        assert!((ratio(&base) - ratio(&scaled)).abs() < 1e-9);
    }
}
