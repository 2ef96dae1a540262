//! Report emission.
//!
//! Renders the computed structures into the output artifacts: five CSV
//! tables, a multi-panel chart, and a Markdown summary. Pure rendering —
//! nothing is recomputed here, and every number comes from the aggregation,
//! classification, and risk stages.

pub mod chart;
pub mod markdown;
pub mod tables;

use std::path::Path;

use log::info;

use crate::config::StudyConfig;
use crate::error::Result;
use crate::risk::RiskReport;
use crate::tier::Classification;

pub use chart::ChartStyle;

/// Everything the reporter renders, borrowed from the pipeline stages
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub config: &'a StudyConfig,
    pub classification: &'a Classification,
    pub risks: &'a RiskReport,
    /// Arrest count before geographic filtering
    pub arrests_total: usize,
    /// Arrest count inside the study area
    pub arrests_filtered: usize,
}

/// Write all output artifacts into `out_dir`
pub fn write_artifacts(
    out_dir: &Path,
    inputs: &ReportInputs<'_>,
    style: &ChartStyle,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;

    tables::write_block_groups(&out_dir.join("block_groups.csv"), inputs.classification)?;
    tables::write_tier_stats(&out_dir.join("tier_stats.csv"), &inputs.classification.stats)?;
    tables::write_overall_risks(&out_dir.join("annual_risks.csv"), &inputs.risks.overall)?;
    tables::write_subgroup_risks(&out_dir.join("subgroup_risks.csv"), &inputs.risks.subgroup)?;
    tables::write_crime_subset_risks(
        &out_dir.join("crime_subset_risks.csv"),
        &inputs.risks.crime_subset,
    )?;

    chart::render(&out_dir.join("intensity_analysis.png"), inputs, style)?;

    let report = markdown::render(inputs);
    std::fs::write(out_dir.join("analysis_report.md"), report)?;

    info!("Wrote output artifacts to {}", out_dir.display());
    Ok(())
}
