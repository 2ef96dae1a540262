//! CSV table emission.

use std::path::Path;

use crate::error::Result;
use crate::models::{CrimeSubsetRisk, SubgroupRisk, TierRisk, TierStats};
use crate::tier::Classification;

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_default()
}

/// Per-block-group table in the classifier's sorted order
pub fn write_block_groups(path: &Path, classification: &Classification) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "blockgroup_id",
        "total_pop",
        "white_pop",
        "black_pop",
        "hispanic_pop",
        "median_income",
        "poverty_count",
        "total_arrests",
        "discretionary_arrests",
        "unique_individuals",
        "total_per_1000",
        "discretionary_per_1000",
        "unique_per_1000",
        "cumulative_pop",
        "cumulative_pop_pct",
        "policing_category",
    ])?;
    for row in &classification.rows {
        let a = &row.aggregate;
        writer.write_record([
            a.blockgroup_id.clone(),
            a.total_pop.to_string(),
            a.white_pop.to_string(),
            a.black_pop.to_string(),
            a.hispanic_pop.to_string(),
            fmt_opt(a.median_income),
            a.poverty_count.to_string(),
            a.total_arrests.to_string(),
            a.discretionary_arrests.to_string(),
            a.unique_individuals.to_string(),
            format!("{:.6}", a.total_per_1000),
            format!("{:.6}", a.discretionary_per_1000),
            format!("{:.6}", a.unique_per_1000),
            row.cumulative_pop.to_string(),
            format!("{:.6}", row.cumulative_pop_pct),
            row.tier.label().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Per-tier rollup table
pub fn write_tier_stats(path: &Path, stats: &[TierStats]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "policing_category",
        "num_blockgroups",
        "total_pop",
        "white_pop",
        "black_pop",
        "hispanic_pop",
        "total_arrests",
        "discretionary_arrests",
        "unique_individuals",
        "pop_pct",
        "total_per_1000",
        "disc_per_1000",
        "unique_per_1000",
    ])?;
    for s in stats {
        writer.write_record([
            s.tier.label().to_string(),
            s.block_groups.to_string(),
            s.total_pop.to_string(),
            s.white_pop.to_string(),
            s.black_pop.to_string(),
            s.hispanic_pop.to_string(),
            s.total_arrests.to_string(),
            s.discretionary_arrests.to_string(),
            s.unique_individuals.to_string(),
            format!("{:.6}", s.pop_pct),
            format!("{:.6}", s.total_per_1000),
            format!("{:.6}", s.discretionary_per_1000),
            format!("{:.6}", s.unique_per_1000),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Overall annual risk per tier
pub fn write_overall_risks(path: &Path, risks: &[TierRisk]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "policing_category",
        "population",
        "unique_individuals",
        "annual_risk_pct",
    ])?;
    for r in risks {
        writer.write_record([
            r.tier.label().to_string(),
            r.population.to_string(),
            r.unique_individuals.to_string(),
            format!("{:.6}", r.annual_risk_pct),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Subgroup annual risk per tier; the population column is an estimate
pub fn write_subgroup_risks(path: &Path, risks: &[SubgroupRisk]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "policing_category",
        "estimated_population",
        "unique_individuals",
        "annual_risk_pct",
    ])?;
    for r in risks {
        writer.write_record([
            r.tier.label().to_string(),
            format!("{:.1}", r.estimated_population),
            r.unique_individuals.to_string(),
            format!("{:.6}", r.annual_risk_pct),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Crime-subset annual per-1,000 rate per tier
pub fn write_crime_subset_risks(path: &Path, risks: &[CrimeSubsetRisk]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "policing_category",
        "unique_individuals",
        "annual_per_1000",
    ])?;
    for r in risks {
        writer.write_record([
            r.tier.label().to_string(),
            r.unique_individuals.to_string(),
            format!("{:.6}", r.annual_per_1000),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
