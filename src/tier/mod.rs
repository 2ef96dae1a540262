//! Population-weighted tier classification.
//!
//! Block groups are sorted by discretionary arrest rate, highest first, and
//! the cut rates are read off where the cumulative population share first
//! reaches the configured thresholds. Every block group then lands in exactly
//! one of the three intensity tiers:
//!
//! * rate >= cut1            -> Ultra-Policed
//! * cut2 <= rate < cut1     -> Highly Policed
//! * rate < cut2             -> Normally Policed
//!
//! Ties at a cut rate all fall on the same side by construction. Rows with
//! equal rates are ordered by block-group id so the cumulative walk, and
//! therefore the cut rates, are deterministic.

use log::info;

use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::models::{BlockGroupAggregate, Tier, TierStats, TieredBlockGroup};

/// The two cut rates and the sorted positions they were read from
#[derive(Debug, Clone, Copy)]
pub struct CutPoints {
    pub cut1_rate: f64,
    pub cut2_rate: f64,
    pub cut1_index: usize,
    pub cut2_index: usize,
}

/// Classifier output: every row labeled, plus the cuts and per-tier rollups
#[derive(Debug, Clone)]
pub struct Classification {
    /// Rows in rate-descending order with cumulative population bookkeeping
    pub rows: Vec<TieredBlockGroup>,
    pub cuts: CutPoints,
    /// One rollup per tier, in `Tier::ALL` order, including empty tiers
    pub stats: Vec<TierStats>,
}

/// First sorted index whose cumulative population percentage reaches
/// `threshold_pct`. An explicit search: "no row qualifies" is an error, never
/// a silent index 0.
fn cut_index(cumulative_pct: &[f64], threshold_pct: f64) -> Result<usize> {
    cumulative_pct
        .iter()
        .position(|&pct| pct >= threshold_pct)
        .ok_or_else(|| StudyError::ThresholdUnreachable {
            threshold_pct,
            reached_pct: cumulative_pct.last().copied().unwrap_or(0.0),
        })
}

/// Assign every block-group aggregate to a tier and roll the tiers up.
///
/// Fails with `ThresholdUnreachable` when a cut threshold is never reached
/// (e.g. a threshold above 100%).
pub fn classify(
    mut aggregates: Vec<BlockGroupAggregate>,
    config: &StudyConfig,
) -> Result<Classification> {
    if aggregates.is_empty() {
        return Err(StudyError::NoGeographicOverlap);
    }

    // Rate descending, ties broken by block-group id ascending
    aggregates.sort_by(|a, b| {
        b.discretionary_per_1000
            .total_cmp(&a.discretionary_per_1000)
            .then_with(|| a.blockgroup_id.cmp(&b.blockgroup_id))
    });

    let total_pop: i64 = aggregates.iter().map(|a| a.total_pop).sum();
    let mut cumulative = 0i64;
    let mut cumulative_pop = Vec::with_capacity(aggregates.len());
    let mut cumulative_pct = Vec::with_capacity(aggregates.len());
    for aggregate in &aggregates {
        cumulative += aggregate.total_pop;
        cumulative_pop.push(cumulative);
        cumulative_pct.push(cumulative as f64 / total_pop as f64 * 100.0);
    }

    let cut1_index = cut_index(&cumulative_pct, config.cut1_pop_pct)?;
    let cut2_index = cut_index(&cumulative_pct, config.cut2_pop_pct)?;
    let cuts = CutPoints {
        cut1_rate: aggregates[cut1_index].discretionary_per_1000,
        cut2_rate: aggregates[cut2_index].discretionary_per_1000,
        cut1_index,
        cut2_index,
    };

    info!(
        "Cut points: {:.1} per 1,000 (top {:.1}% of population), {:.1} per 1,000 (top {:.1}%)",
        cuts.cut1_rate,
        cumulative_pct[cut1_index],
        cuts.cut2_rate,
        cumulative_pct[cut2_index]
    );

    let rows: Vec<TieredBlockGroup> = aggregates
        .into_iter()
        .zip(cumulative_pop.iter().zip(&cumulative_pct))
        .map(|(aggregate, (&cumulative_pop, &cumulative_pop_pct))| {
            let rate = aggregate.discretionary_per_1000;
            let tier = if rate >= cuts.cut1_rate {
                Tier::Ultra
            } else if rate >= cuts.cut2_rate {
                Tier::Highly
            } else {
                Tier::Normally
            };
            TieredBlockGroup {
                aggregate,
                cumulative_pop,
                cumulative_pop_pct,
                tier,
            }
        })
        .collect();

    let stats = rollup(&rows, total_pop);
    for tier_stats in &stats {
        info!(
            "{}: {} block groups, population {} ({:.1}%), {:.1} discretionary per 1,000",
            tier_stats.tier,
            tier_stats.block_groups,
            tier_stats.total_pop,
            tier_stats.pop_pct,
            tier_stats.discretionary_per_1000
        );
    }

    Ok(Classification { rows, cuts, stats })
}

fn rollup(rows: &[TieredBlockGroup], total_pop: i64) -> Vec<TierStats> {
    Tier::ALL
        .iter()
        .map(|&tier| {
            let mut stats = TierStats {
                tier,
                block_groups: 0,
                total_pop: 0,
                white_pop: 0,
                black_pop: 0,
                hispanic_pop: 0,
                total_arrests: 0,
                discretionary_arrests: 0,
                unique_individuals: 0,
                pop_pct: 0.0,
                total_per_1000: 0.0,
                discretionary_per_1000: 0.0,
                unique_per_1000: 0.0,
            };
            for row in rows.iter().filter(|r| r.tier == tier) {
                let a = &row.aggregate;
                stats.block_groups += 1;
                stats.total_pop += a.total_pop;
                stats.white_pop += a.white_pop;
                stats.black_pop += a.black_pop;
                stats.hispanic_pop += a.hispanic_pop;
                stats.total_arrests += a.total_arrests;
                stats.discretionary_arrests += a.discretionary_arrests;
                stats.unique_individuals += a.unique_individuals;
            }
            if stats.total_pop > 0 {
                stats.pop_pct = stats.total_pop as f64 / total_pop as f64 * 100.0;
                let pop = stats.total_pop as f64;
                stats.total_per_1000 = stats.total_arrests as f64 / pop * 1000.0;
                stats.discretionary_per_1000 = stats.discretionary_arrests as f64 / pop * 1000.0;
                stats.unique_per_1000 = stats.unique_individuals as f64 / pop * 1000.0;
            }
            stats
        })
        .collect()
}
