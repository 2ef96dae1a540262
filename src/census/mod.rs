//! Census population reference.
//!
//! The population table is keyed by block-group GEOID and comes from one of
//! two places: a local CSV cache, or the ACS 5-year API when the cache is
//! absent. A successful fetch is written to the cache before the analysis
//! proceeds, so reruns skip the network entirely. Fetch failure with no
//! cache is fatal — a single attempt, no retries.

use std::path::Path;
use std::time::Duration;

use log::info;
use reqwest::Client;

use crate::config::StudyConfig;
use crate::error::{Result, StudyError};
use crate::models::PopulationRecord;

const ACS_BASE_URL: &str = "https://api.census.gov/data";
const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// ACS variable codes and the table columns they map to
const ACS_VARIABLES: &[(&str, &str)] = &[
    ("B01001_001E", "total_pop"),
    ("B01001_002E", "male_pop"),
    ("B01001_026E", "female_pop"),
    ("B02001_002E", "white_pop"),
    ("B02001_003E", "black_pop"),
    ("B03002_012E", "hispanic_pop"),
    ("B19013_001E", "median_income"),
    ("B17001_002E", "poverty_count"),
    ("B25077_001E", "median_home_value"),
];

/// Load the population table, preferring the CSV cache over the network
pub async fn load_population(
    cache_path: &Path,
    config: &StudyConfig,
) -> Result<Vec<PopulationRecord>> {
    if cache_path.exists() {
        info!("Loading cached census data from {}", cache_path.display());
        return read_cache(cache_path);
    }

    info!(
        "No census cache at {}; fetching ACS {} data for counties {:?}",
        cache_path.display(),
        config.acs_year,
        config.target_counties
    );
    let records = fetch_acs(config).await?;
    write_cache(cache_path, &records)?;
    info!("Saved census data to {}", cache_path.display());
    Ok(records)
}

/// Read the population table from the CSV cache
pub fn read_cache(path: &Path) -> Result<Vec<PopulationRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    info!("Census data: {} block groups", records.len());
    Ok(records)
}

/// Write the population table to the CSV cache
pub fn write_cache(path: &Path, records: &[PopulationRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Fetch block-group population data for every target county
async fn fetch_acs(config: &StudyConfig) -> Result<Vec<PopulationRecord>> {
    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(StudyError::Http)?;

    let variables: Vec<&str> = ACS_VARIABLES.iter().map(|(code, _)| *code).collect();
    let var_string = variables.join(",");

    let mut records = Vec::new();
    for county in &config.target_counties {
        let url = format!(
            "{ACS_BASE_URL}/{}/acs/acs5?get=NAME,{var_string}&for=block%20group:*&in=state:{}&in=county:{county}",
            config.acs_year, config.state_code
        );
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| StudyError::ExternalFetchFailure(format!("county {county}: {e}")))?;
        if !response.status().is_success() {
            return Err(StudyError::ExternalFetchFailure(format!(
                "county {county}: HTTP {}",
                response.status()
            )));
        }
        let payload: Vec<Vec<Option<String>>> = response
            .json()
            .await
            .map_err(|e| StudyError::ExternalFetchFailure(format!("county {county}: {e}")))?;
        let county_records = parse_acs_payload(&payload)?;
        info!(
            "Fetched county {county}: {} block groups",
            county_records.len()
        );
        records.extend(county_records);
    }

    if records.is_empty() {
        return Err(StudyError::ExternalFetchFailure(
            "census API returned no block groups for the target counties".to_string(),
        ));
    }
    Ok(records)
}

/// Decode the ACS array-of-arrays payload: a header row naming columns,
/// then one row per block group. The GEOID is the concatenation of the
/// state, county, tract, and block-group columns.
pub fn parse_acs_payload(payload: &[Vec<Option<String>>]) -> Result<Vec<PopulationRecord>> {
    let (header, rows) = payload
        .split_first()
        .ok_or_else(|| StudyError::ExternalFetchFailure("empty census payload".to_string()))?;

    let index_of = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h.as_deref() == Some(name))
            .ok_or_else(|| {
                StudyError::ExternalFetchFailure(format!("census payload missing column '{name}'"))
            })
    };

    let name_idx = index_of("NAME")?;
    let state_idx = index_of("state")?;
    let county_idx = index_of("county")?;
    let tract_idx = index_of("tract")?;
    let bg_idx = index_of("block group")?;
    let mut var_idx = Vec::with_capacity(ACS_VARIABLES.len());
    for (code, _) in ACS_VARIABLES {
        var_idx.push(index_of(code)?);
    }

    let cell = |row: &[Option<String>], idx: usize| -> String {
        row.get(idx).and_then(|v| v.clone()).unwrap_or_default()
    };
    // Counts default to 0 when missing
    let count = |row: &[Option<String>], idx: usize| -> i64 {
        cell(row, idx).parse().unwrap_or(0)
    };
    // Estimates use large negative sentinels for missing values
    let estimate = |row: &[Option<String>], idx: usize| -> Option<f64> {
        cell(row, idx).parse::<f64>().ok().filter(|v| *v >= 0.0)
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let blockgroup_id = format!(
            "{}{}{}{}",
            cell(row, state_idx),
            cell(row, county_idx),
            cell(row, tract_idx),
            cell(row, bg_idx)
        );
        records.push(PopulationRecord {
            blockgroup_id,
            bg_name: cell(row, name_idx),
            total_pop: count(row, var_idx[0]),
            male_pop: count(row, var_idx[1]),
            female_pop: count(row, var_idx[2]),
            white_pop: count(row, var_idx[3]),
            black_pop: count(row, var_idx[4]),
            hispanic_pop: count(row, var_idx[5]),
            median_income: estimate(row, var_idx[6]),
            poverty_count: count(row, var_idx[7]),
            median_home_value: estimate(row, var_idx[8]),
        });
    }
    Ok(records)
}
