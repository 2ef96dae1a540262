//! Multi-panel chart rendering.
//!
//! One PNG with six panels: the discretionary-rate distribution with both
//! cut rates marked, population share by tier, the three per-tier risk bar
//! charts, and a text summary. Styling is passed in explicitly via
//! `ChartStyle` — there is no process-wide theme state.

use std::path::Path;

use plotters::prelude::*;

use crate::error::{Result, StudyError};
use crate::models::Tier;

use super::ReportInputs;

/// Explicit chart styling, passed into the renderer
#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
    /// Fill colors for Ultra, Highly, and Normally Policed bars
    pub tier_colors: [RGBColor; 3],
    pub histogram_color: RGBColor,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 1000,
            histogram_bins: 30,
            tier_colors: [
                RGBColor(139, 0, 0),     // dark red
                RGBColor(255, 165, 0),   // orange
                RGBColor(144, 238, 144), // light green
            ],
            histogram_color: RGBColor(70, 130, 180), // steel blue
        }
    }
}

fn chart_err(error: impl std::fmt::Display) -> StudyError {
    StudyError::Chart(error.to_string())
}

/// Render the six-panel analysis chart to `path`
pub fn render(path: &Path, inputs: &ReportInputs<'_>, style: &ChartStyle) -> Result<()> {
    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let (title_area, body) = root.split_vertically(50);
    title_area
        .titled(
            "Policing Intensity Analysis",
            ("sans-serif", 28).into_font(),
        )
        .map_err(chart_err)?;

    let panels = body.split_evenly((2, 3));

    draw_rate_histogram(&panels[0], inputs, style)?;
    draw_population_share(&panels[1], inputs, style)?;

    let overall: Vec<f64> = Tier::ALL
        .iter()
        .map(|&t| {
            inputs
                .risks
                .overall
                .iter()
                .find(|r| r.tier == t)
                .map_or(0.0, |r| r.annual_risk_pct)
        })
        .collect();
    draw_bar_panel(
        &panels[2],
        "Overall Annual Risk",
        "Annual Risk (%)",
        &overall,
        style,
    )?;

    let subgroup: Vec<f64> = Tier::ALL
        .iter()
        .map(|&t| {
            inputs
                .risks
                .subgroup
                .iter()
                .find(|r| r.tier == t)
                .map_or(0.0, |r| r.annual_risk_pct)
        })
        .collect();
    let subgroup_cfg = &inputs.config.subgroup;
    draw_bar_panel(
        &panels[3],
        &format!(
            "{} ({}-{}) Annual Risk (est. population)",
            subgroup_cfg.gender, subgroup_cfg.min_age, subgroup_cfg.max_age
        ),
        "Annual Risk (%)",
        &subgroup,
        style,
    )?;

    let subset: Vec<f64> = Tier::ALL
        .iter()
        .map(|&t| {
            inputs
                .risks
                .crime_subset
                .iter()
                .find(|r| r.tier == t)
                .map_or(0.0, |r| r.annual_per_1000)
        })
        .collect();
    draw_bar_panel(
        &panels[4],
        &format!("{} Arrests Per Capita", inputs.config.crime_keyword),
        "Per 1,000 Annually",
        &subset,
        style,
    )?;

    draw_summary(&panels[5], inputs)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

type Panel<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

fn draw_rate_histogram(
    panel: &Panel<'_>,
    inputs: &ReportInputs<'_>,
    style: &ChartStyle,
) -> Result<()> {
    let rates: Vec<f64> = inputs
        .classification
        .rows
        .iter()
        .map(|r| r.aggregate.discretionary_per_1000)
        .collect();
    let max_rate = rates.iter().fold(0.0f64, |m, &r| m.max(r)).max(1.0);
    let bin_width = max_rate / style.histogram_bins as f64;

    let mut counts = vec![0usize; style.histogram_bins];
    for &rate in &rates {
        let bin = ((rate / bin_width) as usize).min(style.histogram_bins - 1);
        counts[bin] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(1).max(1) as f64;

    let mut chart = ChartBuilder::on(panel)
        .caption("Discretionary Arrest Rate Distribution", ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(0.0..max_rate * 1.02, 0.0..max_count * 1.1)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_desc("Discretionary Arrests per 1,000")
        .y_desc("Number of Block Groups")
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let x0 = i as f64 * bin_width;
            Rectangle::new(
                [(x0, 0.0), (x0 + bin_width, count as f64)],
                style.histogram_color.filled(),
            )
        }))
        .map_err(chart_err)?;

    let cuts = inputs.classification.cuts;
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(cuts.cut1_rate, 0.0), (cuts.cut1_rate, max_count * 1.1)],
            RED.stroke_width(2),
        )))
        .map_err(chart_err)?
        .label(format!("Cut 1: {:.0}", cuts.cut1_rate))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], RED.stroke_width(2)));
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(cuts.cut2_rate, 0.0), (cuts.cut2_rate, max_count * 1.1)],
            RGBColor(255, 140, 0).stroke_width(2),
        )))
        .map_err(chart_err)?
        .label(format!("Cut 2: {:.0}", cuts.cut2_rate))
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 18, y)], RGBColor(255, 140, 0).stroke_width(2))
        });

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(chart_err)?;
    Ok(())
}

fn draw_population_share(
    panel: &Panel<'_>,
    inputs: &ReportInputs<'_>,
    style: &ChartStyle,
) -> Result<()> {
    let shares: Vec<f64> = Tier::ALL
        .iter()
        .map(|&t| {
            inputs
                .classification
                .stats
                .iter()
                .find(|s| s.tier == t)
                .map_or(0.0, |s| s.pop_pct)
        })
        .collect();
    draw_bar_panel(
        panel,
        "Population Share by Tier",
        "Share of Population (%)",
        &shares,
        style,
    )
}

/// One bar per tier, colored by tier
fn draw_bar_panel(
    panel: &Panel<'_>,
    title: &str,
    y_desc: &str,
    values: &[f64],
    style: &ChartStyle,
) -> Result<()> {
    let max_value = values.iter().fold(0.0f64, |m, &v| m.max(v)).max(1e-6);

    let mut chart = ChartBuilder::on(panel)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d((0usize..3usize).into_segmented(), 0.0..max_value * 1.15)
        .map_err(chart_err)?;
    chart
        .configure_mesh()
        .x_labels(3)
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(i) if *i < 3 => Tier::ALL[*i].short_label().to_string(),
            _ => String::new(),
        })
        .y_desc(y_desc)
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(values.iter().enumerate().map(|(i, &value)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), value),
                ],
                style.tier_colors[i].filled(),
            )
        }))
        .map_err(chart_err)?;
    Ok(())
}

fn draw_summary(panel: &Panel<'_>, inputs: &ReportInputs<'_>) -> Result<()> {
    let total_pop: i64 = inputs
        .classification
        .stats
        .iter()
        .map(|s| s.total_pop)
        .sum();
    let ratios = &inputs.risks.ratios;
    let counties = &inputs.config.target_counties;

    let lines = vec![
        "STUDY SUMMARY".to_string(),
        String::new(),
        format!("Counties: {} and {}", counties[0], counties[1]),
        format!("Population: {total_pop}"),
        format!("Block groups: {}", inputs.classification.rows.len()),
        format!(
            "Arrests: {} (of {} before filtering)",
            inputs.arrests_filtered, inputs.arrests_total
        ),
        format!("Study period: {:.1} years", inputs.risks.elapsed_years),
        String::new(),
        "Key disparities (Ultra vs Normally):".to_string(),
        format!("  Overall: {:.1}x", ratios.overall),
        format!("  Subgroup: {:.1}x", ratios.subgroup),
        format!(
            "  {} enforcement: {:.1}x",
            inputs.config.crime_keyword, ratios.crime_subset
        ),
    ];

    for (i, line) in lines.iter().enumerate() {
        panel
            .draw(&Text::new(
                line.clone(),
                (20, 40 + 22 * i as i32),
                ("sans-serif", 15).into_font(),
            ))
            .map_err(chart_err)?;
    }
    Ok(())
}
