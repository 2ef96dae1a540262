//! Markdown report rendering.

use std::fmt::Write as _;

use crate::models::Tier;

use super::ReportInputs;

fn one_in(risk_pct: f64) -> String {
    if risk_pct > 0.0 {
        format!("1 in {:.0}", 100.0 / risk_pct)
    } else {
        "n/a".to_string()
    }
}

/// Render the analysis summary as Markdown
#[must_use]
pub fn render(inputs: &ReportInputs<'_>) -> String {
    let config = inputs.config;
    let classification = inputs.classification;
    let risks = inputs.risks;
    let ratios = &risks.ratios;
    let total_pop: i64 = classification.stats.iter().map(|s| s.total_pop).sum();

    let mut out = String::new();
    let _ = writeln!(out, "# Geographic Policing Intensity Analysis\n");

    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(
        out,
        "Analysis of discretionary arrest rates across census block groups in \
         counties {} and {} (state {}), classifying each block group into a \
         policing-intensity tier and comparing annualized arrest risks between \
         the extreme tiers.\n",
        config.target_counties[0], config.target_counties[1], config.state_code
    );

    let _ = writeln!(out, "## Geographic Scope");
    let _ = writeln!(
        out,
        "- **Block groups analyzed**: {}",
        classification.rows.len()
    );
    let _ = writeln!(out, "- **Total population**: {total_pop}");
    let _ = writeln!(
        out,
        "- **Arrests analyzed**: {} (filtered from {} total)",
        inputs.arrests_filtered, inputs.arrests_total
    );
    let _ = writeln!(
        out,
        "- **Study period**: {} to {} ({:.1} years). The period spans the full \
         dataset's date range, before geographic filtering, so annualized rates \
         reflect the data collection window.",
        risks.min_date, risks.max_date, risks.elapsed_years
    );
    let _ = writeln!(
        out,
        "- **Zero-arrest block groups**: {}.\n",
        if config.include_zero_arrest_block_groups {
            "included with rate 0"
        } else {
            "excluded (inner join with the arrest data)"
        }
    );

    let _ = writeln!(out, "## Tier Cut Points");
    let _ = writeln!(
        out,
        "- Cut 1: {:.1} per 1,000 (cumulative population reaches {:.1}%)",
        classification.cuts.cut1_rate, config.cut1_pop_pct
    );
    let _ = writeln!(
        out,
        "- Cut 2: {:.1} per 1,000 (cumulative population reaches {:.1}%)\n",
        classification.cuts.cut2_rate, config.cut2_pop_pct
    );

    let _ = writeln!(out, "## Population Distribution");
    for stats in &classification.stats {
        let _ = writeln!(
            out,
            "- **{}**: {} block groups, {} people ({:.1}%), {:.1} discretionary \
             arrests per 1,000",
            stats.tier,
            stats.block_groups,
            stats.total_pop,
            stats.pop_pct,
            stats.discretionary_per_1000
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Annual Arrest Risk Disparities\n");
    let _ = writeln!(out, "**Overall population:**");
    for risk in &risks.overall {
        let _ = writeln!(
            out,
            "- {}: {:.2}% annual risk ({})",
            risk.tier,
            risk.annual_risk_pct,
            one_in(risk.annual_risk_pct)
        );
    }
    let _ = writeln!(out, "- **Disparity: {:.1}x**\n", ratios.overall);

    let subgroup = &config.subgroup;
    let _ = writeln!(
        out,
        "**{} aged {}-{}** (subgroup population estimated as {:.0}% of each \
         tier's population, not a measured count):",
        subgroup.gender,
        subgroup.min_age,
        subgroup.max_age,
        subgroup.population_fraction * 100.0
    );
    for risk in &risks.subgroup {
        let _ = writeln!(
            out,
            "- {}: {:.2}% annual risk ({})",
            risk.tier,
            risk.annual_risk_pct,
            one_in(risk.annual_risk_pct)
        );
    }
    let _ = writeln!(out, "- **Disparity: {:.1}x**\n", ratios.subgroup);

    let _ = writeln!(
        out,
        "**{} enforcement** (categories containing \"{}\"; note the per-1,000 \
         normalization, not a percentage):",
        config.crime_keyword, config.crime_keyword
    );
    for risk in &risks.crime_subset {
        let _ = writeln!(
            out,
            "- {}: {:.2} per 1,000 annually",
            risk.tier, risk.annual_per_1000
        );
    }
    let _ = writeln!(out, "- **Disparity: {:.1}x**\n", ratios.crime_subset);

    let _ = writeln!(out, "## Methodology Notes");
    let _ = writeln!(
        out,
        "- Discretionary categories: {}.",
        config.discretionary_categories.join(", ")
    );
    let _ = writeln!(
        out,
        "- Tiers assigned by population-weighted percentile: block groups are \
         sorted by discretionary rate (descending, ties by block-group id) and \
         cut where cumulative population first reaches {:.1}% and {:.1}%.",
        config.cut1_pop_pct, config.cut2_pop_pct
    );
    let _ = writeln!(
        out,
        "- Census population: ACS {} 5-year estimates per block group.",
        config.acs_year
    );
    let _ = writeln!(
        out,
        "- Tier assignment: rate >= {:.1} -> {}; {:.1} <= rate < {:.1} -> {}; \
         rate < {:.1} -> {}.",
        classification.cuts.cut1_rate,
        Tier::Ultra,
        classification.cuts.cut2_rate,
        classification.cuts.cut1_rate,
        Tier::Highly,
        classification.cuts.cut2_rate,
        Tier::Normally
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudyConfig;
    use crate::models::BlockGroupAggregate;
    use crate::risk::RiskReport;
    use crate::tier;
    use chrono::NaiveDate;

    fn aggregate(bg: &str, pop: i64, disc: u64) -> BlockGroupAggregate {
        let rate = disc as f64 / pop as f64 * 1000.0;
        BlockGroupAggregate {
            blockgroup_id: bg.to_string(),
            total_pop: pop,
            white_pop: 0,
            black_pop: 0,
            hispanic_pop: 0,
            median_income: None,
            poverty_count: 0,
            total_arrests: disc,
            discretionary_arrests: disc,
            unique_individuals: disc,
            total_per_1000: rate,
            discretionary_per_1000: rate,
            unique_per_1000: rate,
        }
    }

    fn subgroup_arrest(id: &str, bg: &str) -> crate::models::ArrestRecord {
        crate::models::ArrestRecord {
            defendant_id: id.to_string(),
            arrest_date: NaiveDate::from_ymd_opt(2015, 6, 1).unwrap(),
            geoid: bg.to_string(),
            crime_category: "Drug Poss".to_string(),
            age: Some(25),
            gender: Some("Male".to_string()),
        }
    }

    #[test]
    fn report_contains_key_sections() {
        let config = StudyConfig {
            cut1_pop_pct: 20.0,
            cut2_pop_pct: 60.0,
            ..StudyConfig::default()
        };
        // Five block groups spreading across all three tiers
        let classification = tier::classify(
            vec![
                aggregate("450190001001", 1000, 50),
                aggregate("450190001002", 2000, 60),
                aggregate("450150001001", 3000, 30),
                aggregate("450150001002", 4000, 4),
                aggregate("450150001003", 4000, 2),
            ],
            &config,
        )
        .unwrap();
        // One subgroup drug arrest in the top and bottom tiers keeps every
        // disparity denominator nonzero
        let top_bg = classification.rows.first().unwrap().aggregate.blockgroup_id.clone();
        let bottom_bg = classification.rows.last().unwrap().aggregate.blockgroup_id.clone();
        let arrests = vec![
            subgroup_arrest("d1", &top_bg),
            subgroup_arrest("d2", &bottom_bg),
        ];
        let risks = RiskReport::compute(
            &arrests,
            (
                NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            ),
            &classification,
            &config,
        );
        let risks = risks.unwrap();
        let inputs = ReportInputs {
            config: &config,
            classification: &classification,
            risks: &risks,
            arrests_total: 200,
            arrests_filtered: 140,
        };
        let report = render(&inputs);
        assert!(report.contains("# Geographic Policing Intensity Analysis"));
        assert!(report.contains("## Tier Cut Points"));
        assert!(report.contains("Disparity"));
        assert!(report.contains("estimated"));
    }
}
