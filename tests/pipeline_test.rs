//! End-to-end pipeline test over synthetic data: geographic filtering,
//! aggregation, tier classification, risk computation, and artifact
//! emission, checked against the pipeline's structural invariants.

use chrono::NaiveDate;
use policing_intensity::census;
use policing_intensity::report::{self, ChartStyle, ReportInputs};
use policing_intensity::risk::{self, RiskReport};
use policing_intensity::{
    ArrestRecord, GeoFilter, PopulationRecord, StudyConfig, Tier, aggregate_block_groups, tier,
};

fn arrest(id: &str, bg: &str, date: (i32, u32, u32), category: &str) -> ArrestRecord {
    ArrestRecord {
        defendant_id: id.to_string(),
        arrest_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        geoid: format!("{bg}002"),
        crime_category: category.to_string(),
        age: Some(26),
        gender: Some("Male".to_string()),
    }
}

fn population(bg: &str, total: i64) -> PopulationRecord {
    PopulationRecord {
        blockgroup_id: bg.to_string(),
        bg_name: format!("Block Group {bg}"),
        total_pop: total,
        male_pop: total / 2,
        female_pop: total - total / 2,
        white_pop: total / 2,
        black_pop: total / 3,
        hispanic_pop: total / 10,
        median_income: Some(48_000.0),
        poverty_count: total / 12,
        median_home_value: None,
    }
}

/// Charleston (019) and Berkeley (015) block groups plus one out-of-scope
/// county, with arrest volumes spread so every tier is populated.
fn synthetic_data() -> (Vec<ArrestRecord>, Vec<PopulationRecord>) {
    let block_groups = [
        ("450190001001", 800, 60),  // high rate
        ("450190001002", 1500, 45), // high rate
        ("450150002001", 2500, 25),
        ("450150002002", 4000, 12),
        ("450190003001", 5000, 5),
        ("450150003002", 6000, 2), // low rate
    ];

    let mut arrests = Vec::new();
    let mut pops = Vec::new();
    for (bg, pop, arrest_count) in block_groups {
        pops.push(population(bg, pop));
        for i in 0..arrest_count {
            let category = match i % 4 {
                0 => "Drug Poss",
                1 => "Theft",
                2 => "Traffic",
                _ => "Assault",
            };
            let month = (i % 12) + 1;
            arrests.push(arrest(
                &format!("{bg}-d{i}"),
                bg,
                (2012 + (i % 5) as i32, month as u32, 15),
                category,
            ));
        }
    }

    // Out-of-scope county: must be filtered away, but still part of the
    // study-period date range
    arrests.push(arrest("outside-1", "450130009001", (2010, 1, 1), "Theft"));
    arrests.push(arrest("outside-2", "450130009001", (2019, 12, 31), "Theft"));

    (arrests, pops)
}

#[test]
fn full_pipeline_invariants() {
    let (arrests, pops) = synthetic_data();
    let config = StudyConfig {
        cut1_pop_pct: 10.0,
        cut2_pop_pct: 40.0,
        ..StudyConfig::default()
    };

    let arrests_total = arrests.len();
    let full_date_range = risk::date_range(&arrests).unwrap();
    assert_eq!(full_date_range.0, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
    assert_eq!(
        full_date_range.1,
        NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
    );

    let filter = GeoFilter::new(&config);
    let filtered = filter.filter(arrests).unwrap();
    assert_eq!(filtered.len(), arrests_total - 2);
    // Idempotent: a second pass removes nothing
    let refiltered = filter.filter(filtered.clone()).unwrap();
    assert_eq!(refiltered.len(), filtered.len());

    let aggregates = aggregate_block_groups(&filtered, &pops, &config).unwrap();
    assert_eq!(aggregates.len(), 6);
    assert!(aggregates.iter().all(|a| a.total_pop > 0));

    let joined_pop: i64 = aggregates.iter().map(|a| a.total_pop).sum();
    let classification = tier::classify(aggregates, &config).unwrap();

    // Every row carries exactly one tier; tiers never interleave when
    // walking rates downward
    let mut previous = Tier::Ultra;
    for row in &classification.rows {
        assert!(row.tier >= previous);
        previous = row.tier;
    }
    for tier in Tier::ALL {
        assert!(
            classification.stats.iter().any(|s| s.tier == tier),
            "missing rollup for {tier}"
        );
    }

    // No population double-counted or dropped between aggregation and rollup
    let tier_pop: i64 = classification.stats.iter().map(|s| s.total_pop).sum();
    assert_eq!(tier_pop, joined_pop);

    // Cumulative share ends at 100%
    let last = classification.rows.last().unwrap();
    assert!((last.cumulative_pop_pct - 100.0).abs() < 1e-9);

    let risks = RiskReport::compute(&filtered, full_date_range, &classification, &config).unwrap();
    assert!(risks.ratios.overall > 1.0);
    assert!(risks.elapsed_years > 9.9 && risks.elapsed_years < 10.1);

    // Scale invariance: multiplying every population by 3 leaves the
    // disparity ratio unchanged
    let scaled_pops: Vec<PopulationRecord> = pops
        .iter()
        .map(|p| PopulationRecord {
            total_pop: p.total_pop * 3,
            ..p.clone()
        })
        .collect();
    let scaled_aggregates = aggregate_block_groups(&filtered, &scaled_pops, &config).unwrap();
    let scaled_classification = tier::classify(scaled_aggregates, &config).unwrap();
    let scaled_risks =
        RiskReport::compute(&filtered, full_date_range, &scaled_classification, &config).unwrap();
    assert!((scaled_risks.ratios.overall - risks.ratios.overall).abs() < 1e-9);
}

#[test]
fn artifacts_are_written() {
    let (arrests, pops) = synthetic_data();
    let config = StudyConfig {
        cut1_pop_pct: 10.0,
        cut2_pop_pct: 40.0,
        ..StudyConfig::default()
    };
    let arrests_total = arrests.len();
    let full_date_range = risk::date_range(&arrests).unwrap();
    let filtered = GeoFilter::new(&config).filter(arrests).unwrap();
    let aggregates = aggregate_block_groups(&filtered, &pops, &config).unwrap();
    let classification = tier::classify(aggregates, &config).unwrap();
    let risks = RiskReport::compute(&filtered, full_date_range, &classification, &config).unwrap();

    let out_dir = std::env::temp_dir().join("policing-intensity-artifact-test");
    let inputs = ReportInputs {
        config: &config,
        classification: &classification,
        risks: &risks,
        arrests_total,
        arrests_filtered: filtered.len(),
    };
    report::write_artifacts(&out_dir, &inputs, &ChartStyle::default()).unwrap();

    for artifact in [
        "block_groups.csv",
        "tier_stats.csv",
        "annual_risks.csv",
        "subgroup_risks.csv",
        "crime_subset_risks.csv",
        "intensity_analysis.png",
        "analysis_report.md",
    ] {
        assert!(out_dir.join(artifact).exists(), "missing {artifact}");
    }

    // Census cache round-trips through the same directory
    let cache = out_dir.join("census_cache.csv");
    census::write_cache(&cache, &pops).unwrap();
    let reread = census::read_cache(&cache).unwrap();
    assert_eq!(reread.len(), pops.len());

    std::fs::remove_dir_all(&out_dir).ok();
}
