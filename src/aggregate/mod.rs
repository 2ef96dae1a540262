//! Per-block-group aggregation of the filtered arrest set.
//!
//! Groups arrests by block-group code, counts total, discretionary, and
//! distinct-defendant arrests, joins the counts with the census population
//! table, and derives per-1,000 rates. Block groups with zero or unknown
//! population are dropped before rate computation.

use log::info;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::geo::block_group_id;
use crate::models::{ArrestRecord, BlockGroupAggregate, PopulationRecord};

#[derive(Default)]
struct ArrestCounts<'a> {
    total: u64,
    discretionary: u64,
    defendants: FxHashSet<&'a str>,
}

fn per_1000(count: u64, population: i64) -> f64 {
    count as f64 / population as f64 * 1000.0
}

/// Build one aggregate row per block group present in both the arrest set
/// and the population table (or, with `include_zero_arrest_block_groups`,
/// per block group in the population table).
///
/// Fails with `NoGeographicOverlap` when the join yields no rows at all,
/// so an empty table can never flow into the classifier.
pub fn aggregate_block_groups(
    arrests: &[ArrestRecord],
    population: &[PopulationRecord],
    config: &StudyConfig,
) -> Result<Vec<BlockGroupAggregate>> {
    let discretionary: FxHashSet<&str> = config
        .discretionary_categories
        .iter()
        .map(String::as_str)
        .collect();

    // Group arrests by block-group code
    let mut counts: FxHashMap<&str, ArrestCounts> = FxHashMap::default();
    for record in arrests {
        let bg = block_group_id(&record.geoid)?;
        let entry = counts.entry(bg).or_default();
        entry.total += 1;
        if discretionary.contains(record.crime_category.as_str()) {
            entry.discretionary += 1;
        }
        entry.defendants.insert(record.defendant_id.as_str());
    }

    let discretionary_total: u64 = counts.values().map(|c| c.discretionary).sum();
    info!(
        "Aggregated {} arrests ({} discretionary) across {} block groups",
        arrests.len(),
        discretionary_total,
        counts.len()
    );

    // Join with the population table
    let mut rows = Vec::new();
    let mut dropped_zero_pop = 0usize;
    for pop in population {
        let arrest_counts = counts.get(pop.blockgroup_id.as_str());
        if arrest_counts.is_none() && !config.include_zero_arrest_block_groups {
            continue;
        }
        if pop.total_pop <= 0 {
            dropped_zero_pop += 1;
            continue;
        }
        let (total, disc, unique) = arrest_counts.map_or((0, 0, 0), |c| {
            (c.total, c.discretionary, c.defendants.len() as u64)
        });
        rows.push(BlockGroupAggregate {
            blockgroup_id: pop.blockgroup_id.clone(),
            total_pop: pop.total_pop,
            white_pop: pop.white_pop,
            black_pop: pop.black_pop,
            hispanic_pop: pop.hispanic_pop,
            median_income: pop.median_income,
            poverty_count: pop.poverty_count,
            total_arrests: total,
            discretionary_arrests: disc,
            unique_individuals: unique,
            total_per_1000: per_1000(total, pop.total_pop),
            discretionary_per_1000: per_1000(disc, pop.total_pop),
            unique_per_1000: per_1000(unique, pop.total_pop),
        });
    }

    if rows.is_empty() {
        return Err(StudyError::NoGeographicOverlap);
    }

    // Deterministic output order regardless of map iteration
    rows.sort_by(|a, b| a.blockgroup_id.cmp(&b.blockgroup_id));

    info!(
        "Joined {} block groups with census data ({} dropped for zero population); \
         population coverage {}",
        rows.len(),
        dropped_zero_pop,
        rows.iter().map(|r| r.total_pop).sum::<i64>()
    );

    Ok(rows)
}
